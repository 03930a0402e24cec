//! Error types for pool operations
use std::sync::Arc;

use thiserror::Error;

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Shared, cloneable cause attached to creation failures.
///
/// A single failed creation is reported to every caller that was waiting on
/// it, so the cause has to be shareable.
pub type SharedCause = Arc<dyn std::error::Error + Send + Sync>;

/// Errors returned by [`Pool`](crate::Pool) operations.
///
/// Disposal failures never show up here: they are logged and swallowed.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Pool configuration is invalid
    #[error("Configuration error: {message}")]
    Configuration {
        /// The error message
        message: String,
    },

    /// The factory failed to create the instance for a key
    #[error("Resource '{resource_id}' is unavailable: {reason}")]
    Unavailable {
        /// The resource identifier
        resource_id: String,
        /// The failure reason
        reason: String,
        /// The underlying factory error
        #[source]
        source: Option<SharedCause>,
    },

    /// Every slot is borrowed and nothing could be evicted in time
    #[error("Resource pool exhausted for '{resource_id}': {capacity} slots in use after {waited_ms}ms")]
    PoolExhausted {
        /// The resource identifier
        resource_id: String,
        /// Configured capacity
        capacity: usize,
        /// How long the caller waited for a slot
        waited_ms: u64,
    },

    /// The caller that was creating the instance went away before finishing
    #[error("Creation of resource '{resource_id}' was abandoned by its initiator")]
    CreationAbandoned {
        /// The resource identifier
        resource_id: String,
    },

    /// The pool has been shut down
    #[error("Resource pool '{resource_id}' is shut down")]
    Closed {
        /// The resource identifier
        resource_id: String,
    },

    /// Operation timeout
    #[error("Operation '{operation}' timed out after {timeout_ms}ms for resource '{resource_id}'")]
    Timeout {
        /// The resource identifier
        resource_id: String,
        /// The timeout duration in milliseconds
        timeout_ms: u64,
        /// The operation that timed out
        operation: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wrap a factory failure
    pub fn unavailable(
        resource_id: impl Into<String>,
        cause: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Unavailable {
            resource_id: resource_id.into(),
            reason: cause.to_string(),
            source: Some(Arc::from(cause)),
        }
    }

    /// Create a pool-closed error
    pub fn closed(resource_id: impl Into<String>) -> Self {
        Self::Closed {
            resource_id: resource_id.into(),
        }
    }

    /// Check if this error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable { .. }
            | Self::PoolExhausted { .. }
            | Self::CreationAbandoned { .. }
            | Self::Timeout { .. } => true,
            Self::Configuration { .. } | Self::Closed { .. } => false,
        }
    }

    /// The factory error behind an [`Error::Unavailable`], for downcasting.
    #[must_use]
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Unavailable { source, .. } => source.as_deref(),
            _ => None,
        }
    }

    /// Get the resource ID associated with this error (if any)
    #[must_use]
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Self::Configuration { .. } => None,
            Self::Unavailable { resource_id, .. }
            | Self::PoolExhausted { resource_id, .. }
            | Self::CreationAbandoned { resource_id }
            | Self::Closed { resource_id }
            | Self::Timeout { resource_id, .. } => Some(resource_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct Refused;

    #[test]
    fn unavailable_keeps_cause_for_downcast() {
        let err = Error::unavailable("ftp", Box::new(Refused));
        assert!(err.is_retryable());
        assert_eq!(err.resource_id(), Some("ftp"));
        assert!(err.cause().is_some_and(|c| c.downcast_ref::<Refused>().is_some()));
        assert_eq!(
            err.to_string(),
            "Resource 'ftp' is unavailable: connection refused"
        );
    }

    #[test]
    fn closed_and_configuration_are_not_retryable() {
        assert!(!Error::closed("ftp").is_retryable());
        assert!(!Error::configuration("bad").is_retryable());
        assert_eq!(Error::configuration("bad").resource_id(), None);
    }
}
