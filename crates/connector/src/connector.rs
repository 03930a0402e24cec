//! The [`Connector`] trait.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::ConnectorError;
use crate::parameters::Parameters;
use crate::response::Response;

/// Static description of one operation a connector exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationDescriptor {
    /// Operation id used by the host, e.g. `FTPList`.
    pub id: &'static str,
    /// Short human-readable summary.
    pub summary: &'static str,
}

impl OperationDescriptor {
    /// Create a new descriptor.
    pub const fn new(id: &'static str, summary: &'static str) -> Self {
        Self { id, summary }
    }
}

/// A plugin exposing operations against one external system.
///
/// Implementations provide [`Connector::execute`]; hosts call
/// [`Connector::invoke`], which never fails and maps every error onto a
/// status code.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Service provider id, e.g. `/serviceProviders/FTPbuiltin`.
    fn service_id(&self) -> &str;

    /// Operations this connector understands.
    fn operations(&self) -> &[OperationDescriptor];

    /// Run `operation` with the given connection and request parameters.
    async fn execute(
        &self,
        operation: &str,
        connection: &Parameters,
        request: &Parameters,
    ) -> Result<Value, ConnectorError>;

    /// Whether `operation` is one of [`Connector::operations`].
    fn supports(&self, operation: &str) -> bool {
        self.operations().iter().any(|op| op.id == operation)
    }

    /// Host entry point.
    async fn invoke(
        &self,
        operation: &str,
        connection: &Parameters,
        request: &Parameters,
    ) -> Response {
        if !self.supports(operation) {
            let err = ConnectorError::NotImplemented(operation.to_string());
            tracing::warn!(
                component = self.service_id(),
                operation,
                "unknown operation"
            );
            return Response::from_error(&err);
        }

        match self.execute(operation, connection, request).await {
            Ok(body) => {
                tracing::debug!(component = self.service_id(), operation, "operation succeeded");
                Response::ok(body)
            }
            Err(err) => {
                tracing::error!(
                    component = self.service_id(),
                    operation,
                    status = err.status().as_u16(),
                    error = %err,
                    "operation failed"
                );
                Response::from_error(&err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;

    struct Echo;

    const OPS: &[OperationDescriptor] = &[
        OperationDescriptor::new("Echo", "Return the request"),
        OperationDescriptor::new("Fail", "Always fails"),
    ];

    #[async_trait]
    impl Connector for Echo {
        fn service_id(&self) -> &str {
            "/serviceProviders/echo"
        }

        fn operations(&self) -> &[OperationDescriptor] {
            OPS
        }

        async fn execute(
            &self,
            operation: &str,
            _connection: &Parameters,
            request: &Parameters,
        ) -> Result<Value, ConnectorError> {
            match operation {
                "Echo" => Ok(json!(request.required_str("inputParam")?)),
                _ => Err(ConnectorError::operation(StatusCode::NOT_FOUND, "550 missing")),
            }
        }
    }

    #[tokio::test]
    async fn invoke_wraps_success() {
        let request = Parameters::new().with("inputParam", "hi");
        let response = Echo.invoke("Echo", &Parameters::new(), &request).await;
        assert_eq!(response, Response::ok(json!("hi")));
    }

    #[tokio::test]
    async fn invoke_maps_validation_to_400() {
        let response = Echo.invoke("Echo", &Parameters::new(), &Parameters::new()).await;
        assert_eq!(response.status_code, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"]["code"], "ServiceOperationFailed");
    }

    #[tokio::test]
    async fn invoke_keeps_operation_status() {
        let response = Echo.invoke("Fail", &Parameters::new(), &Parameters::new()).await;
        assert_eq!(response.status_code, StatusCode::NOT_FOUND);
        assert_eq!(response.body["error"]["message"], "550 missing");
    }

    #[tokio::test]
    async fn invoke_rejects_unknown_operation() {
        let response = Echo.invoke("Other", &Parameters::new(), &Parameters::new()).await;
        assert_eq!(response.status_code, StatusCode::NOT_IMPLEMENTED);
    }
}
