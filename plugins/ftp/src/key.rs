//! Session cache key.

use std::fmt;

use wharf_connector::{ConnectorError, Parameters};

/// Identity of a pooled FTP session.
///
/// Two requests share a session only if every connection parameter matches
/// exactly (ordinal, case-sensitive string comparison).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FtpCacheKey {
    /// `host` or `host:port`.
    pub host: String,
    pub username: String,
    pub password: String,
    /// Use FTPS.
    pub use_tls: bool,
    /// Implicit rather than explicit FTPS.
    pub implicit_tls: bool,
    /// Active (`PORT`) rather than passive data connections.
    pub active_mode: bool,
    /// Accept self-signed server certificates.
    pub accept_self_signed: bool,
    /// `TYPE I` rather than `TYPE A`.
    pub binary_mode: bool,
}

impl FtpCacheKey {
    /// A plain-FTP, passive, ASCII-mode key.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            use_tls: false,
            implicit_tls: false,
            active_mode: false,
            accept_self_signed: false,
            binary_mode: false,
        }
    }

    /// Build a key from connection parameters.
    ///
    /// # Errors
    /// [`ConnectorError::Validation`] if `servername`, `username` or
    /// `password` is missing, or a flag is not a boolean.
    pub fn from_parameters(params: &Parameters) -> Result<Self, ConnectorError> {
        Ok(Self {
            host: params.required_str("servername")?.to_string(),
            username: params.required_str("username")?.to_string(),
            password: params.required_str("password")?.to_string(),
            use_tls: params.optional_bool("usessl")?,
            implicit_tls: params.optional_bool("implicitmode")?,
            active_mode: params.optional_bool("activemode")?,
            accept_self_signed: params.optional_bool("useselfsignedcert")?,
            binary_mode: params.optional_bool("usebinarymode")?,
        })
    }
}

impl fmt::Debug for FtpCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpCacheKey")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"***")
            .field("use_tls", &self.use_tls)
            .field("implicit_tls", &self.implicit_tls)
            .field("active_mode", &self.active_mode)
            .field("accept_self_signed", &self.accept_self_signed)
            .field("binary_mode", &self.binary_mode)
            .finish()
    }
}
