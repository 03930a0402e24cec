//! Response envelope returned to the host.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use http::StatusCode;
use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::error::ConnectorError;

/// Outcome of one operation: a JSON body plus an HTTP status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Operation output, or an error object on failure.
    pub body: Value,
    /// HTTP status code.
    #[serde(serialize_with = "serialize_status")]
    pub status_code: StatusCode,
}

fn serialize_status<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}

impl Response {
    /// A `200 OK` response.
    pub fn ok(body: Value) -> Self {
        Self {
            body,
            status_code: StatusCode::OK,
        }
    }

    /// An error response with the error's mapped status.
    pub fn from_error(err: &ConnectorError) -> Self {
        Self {
            body: err.to_body(),
            status_code: err.status(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status_code.is_success()
    }
}

/// Wrap binary content the way hosts expect file payloads:
/// `{"$content-type": .., "$content": <base64>}`.
pub fn content_envelope(content_type: &str, bytes: &[u8]) -> Value {
    json!({
        "$content-type": content_type,
        "$content": STANDARD.encode(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_status_as_number() {
        let response = Response::ok(json!("success"));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"body": "success", "statusCode": 200})
        );
    }

    #[test]
    fn envelope_encodes_base64() {
        let value = content_envelope("application/octet-stream", b"hello");
        assert_eq!(value["$content"], "aGVsbG8=");
        assert_eq!(value["$content-type"], "application/octet-stream");
    }
}
