//! Connector error taxonomy and its HTTP status mapping.

use http::StatusCode;
use serde_json::{Value, json};

/// Error code reported in every failure body.
pub const OPERATION_FAILED_CODE: &str = "ServiceOperationFailed";

/// Errors raised while running a connector operation.
///
/// Never crosses the host boundary: [`Connector::invoke`] turns it into a
/// [`Response`] through [`ConnectorError::status`] and
/// [`ConnectorError::to_body`].
///
/// [`Connector::invoke`]: crate::Connector::invoke
/// [`Response`]: crate::Response
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ConnectorError {
    /// Connection or request parameters were missing or malformed.
    #[error("validation: {0}")]
    Validation(String),

    /// The backing client could not be obtained.
    #[error("unavailable: {message}")]
    Unavailable {
        /// Human-readable error message.
        message: String,
    },

    /// The remote system rejected the operation.
    #[error("{message}")]
    Operation {
        /// Status the failure maps to.
        status: StatusCode,
        /// Human-readable error message.
        message: String,
    },

    /// The operation id is not implemented by this connector.
    #[error("operation '{0}' is not implemented")]
    NotImplemented(String),

    /// Anything else.
    #[error("internal: {0}")]
    Internal(String),
}

impl ConnectorError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable {
            message: msg.into(),
        }
    }

    /// Create an operation error with an explicit status.
    pub fn operation(status: StatusCode, msg: impl Into<String>) -> Self {
        Self::Operation {
            status,
            message: msg.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status reported to the host.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Operation { status, .. } => *status,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` if repeating the call later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable { .. } => true,
            Self::Operation { status, .. } => *status == StatusCode::SERVICE_UNAVAILABLE,
            Self::Validation(_) | Self::NotImplemented(_) | Self::Internal(_) => false,
        }
    }

    /// JSON body sent to the host for this error.
    pub fn to_body(&self) -> Value {
        json!({
            "error": {
                "code": OPERATION_FAILED_CODE,
                "message": self.to_string(),
            }
        })
    }
}

impl From<wharf_pool::Error> for ConnectorError {
    fn from(err: wharf_pool::Error) -> Self {
        use wharf_pool::Error as PoolError;
        match err {
            PoolError::Unavailable { .. }
            | PoolError::PoolExhausted { .. }
            | PoolError::CreationAbandoned { .. }
            | PoolError::Closed { .. }
            | PoolError::Timeout { .. } => Self::unavailable(err.to_string()),
            PoolError::Configuration { .. } => Self::internal(err.to_string()),
        }
    }
}
