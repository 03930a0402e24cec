//! FTP client settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Downloads at or above this size are gzip-compressed (100 MiB).
pub const DEFAULT_COMPRESS_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Settings shared by every FTP session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FtpConfig {
    /// Timeout for establishing the control connection and logging in
    pub connect_timeout: Duration,
    /// Timeout for a single command reply or data read
    pub command_timeout: Duration,
    /// Size in bytes from which downloads are gzip-compressed
    pub compress_threshold: u64,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            command_timeout: Duration::from_secs(60),
            compress_threshold: DEFAULT_COMPRESS_THRESHOLD,
        }
    }
}
