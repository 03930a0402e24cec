//! Session abstraction.
//!
//! [`FtpSession`] is what operations run against; [`SessionFactory`] opens
//! one for a key. The pool stores sessions as `Box<dyn FtpSession>`.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::FtpError;
use crate::key::FtpCacheKey;

/// A server reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    /// Three-digit completion code.
    pub code: u16,
    /// Reply text; multi-line replies are joined with `\n`.
    pub message: String,
}

impl Reply {
    /// Create a reply.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// 1xx: the command started, another reply follows.
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// 1xx, 2xx or 3xx.
    pub fn is_positive(&self) -> bool {
        (100..400).contains(&self.code)
    }

    /// Turn a negative reply into an error.
    pub fn into_result(self) -> Result<Self, FtpError> {
        if self.is_positive() {
            Ok(self)
        } else {
            Err(FtpError::Reply {
                code: self.code,
                message: self.message,
            })
        }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListEntry {
    /// File name without directory.
    pub name: String,
    /// Absolute path on the server.
    pub full_name: String,
}

impl ListEntry {
    /// Build an entry for `raw`, a name or path listed inside `dir`.
    pub fn in_dir(dir: &str, raw: &str) -> Self {
        let raw = raw.trim_end_matches('/');
        let name = raw.rsplit('/').next().unwrap_or(raw).to_string();
        let full_name = if raw.starts_with('/') {
            raw.to_string()
        } else if dir.ends_with('/') {
            format!("{dir}{raw}")
        } else {
            format!("{dir}/{raw}")
        };
        Self { name, full_name }
    }
}

/// An FTP client session.
///
/// Sessions are used by one caller at a time; the pool serializes access.
#[async_trait]
pub trait FtpSession: Send {
    /// Open the control connection and log in.
    async fn connect(&mut self) -> Result<(), FtpError>;

    /// Log out and close the control connection.
    async fn disconnect(&mut self) -> Result<(), FtpError>;

    /// Whether the control connection is believed usable. Must not block.
    fn is_connected(&self) -> bool;

    /// List the directory at `path`.
    async fn list(&mut self, path: &str) -> Result<Vec<ListEntry>, FtpError>;

    /// Download the file at `path`.
    async fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, FtpError>;

    /// Upload `data` to `path`, returning the server's final reply.
    async fn store(&mut self, path: &str, data: &[u8]) -> Result<Reply, FtpError>;

    /// Delete the file at `path`.
    async fn delete(&mut self, path: &str) -> Result<(), FtpError>;
}

/// Opens connected sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    /// Open and log in a session for `key`.
    async fn open(&self, key: &FtpCacheKey) -> Result<Box<dyn FtpSession>, FtpError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/pub", "a.txt", "a.txt", "/pub/a.txt")]
    #[case("/pub/", "a.txt", "a.txt", "/pub/a.txt")]
    #[case("/pub", "/pub/a.txt", "a.txt", "/pub/a.txt")]
    #[case("/", "docs/", "docs", "/docs")]
    fn list_entry_paths(
        #[case] dir: &str,
        #[case] raw: &str,
        #[case] name: &str,
        #[case] full: &str,
    ) {
        let entry = ListEntry::in_dir(dir, raw);
        assert_eq!(entry.name, name);
        assert_eq!(entry.full_name, full);
    }

    #[test]
    fn list_entry_serializes_pascal_case() {
        let value = serde_json::to_value(ListEntry::in_dir("/", "a")).unwrap();
        assert_eq!(value, serde_json::json!({"Name": "a", "FullName": "/a"}));
    }

    #[test]
    fn negative_reply_becomes_error() {
        assert!(Reply::new(226, "ok").into_result().is_ok());
        let err = Reply::new(550, "nope").into_result().unwrap_err();
        assert_eq!(err.code(), Some(550));
    }
}
