//! FTP error type and completion-code mapping.

use http::StatusCode;
use wharf_connector::ConnectorError;

/// Errors raised by FTP sessions.
#[derive(Debug, thiserror::Error)]
pub enum FtpError {
    /// The server answered with a transient (4xx) or permanent (5xx) reply.
    #[error("{message}, completion code: {code}")]
    Reply {
        /// Three-digit completion code.
        code: u16,
        /// Reply text.
        message: String,
    },

    /// Socket failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A command or transfer did not finish in time.
    #[error("'{operation}' timed out after {timeout_ms}ms")]
    Timeout {
        /// What was running.
        operation: String,
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// The server said something that is not valid FTP.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The session was asked for something this client cannot do.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The session has no control connection.
    #[error("session is not connected")]
    NotConnected,
}

impl FtpError {
    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// The FTP completion code, if the server sent one.
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Reply { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the control connection can no longer be trusted.
    pub fn breaks_session(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Timeout { .. } | Self::Protocol(_) | Self::NotConnected
        ) || self.code() == Some(421)
    }

    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        self.code()
            .map_or(StatusCode::INTERNAL_SERVER_ERROR, status_for_code)
    }
}

/// Map an FTP completion code to an HTTP status.
///
/// `550` (file unavailable) is `404`, any `4xx` (transient) is `503`,
/// anything else `500`.
pub fn status_for_code(code: u16) -> StatusCode {
    match code {
        550 => StatusCode::NOT_FOUND,
        400..=499 => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<FtpError> for ConnectorError {
    fn from(err: FtpError) -> Self {
        Self::operation(err.status(), err.to_string())
    }
}
