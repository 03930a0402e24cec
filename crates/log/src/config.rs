//! Logger configuration and presets

use serde::{Deserialize, Serialize};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Multi-line, human oriented
    Pretty,
    /// Single line per event
    #[default]
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl Format {
    /// Parse a format name. Unknown names fall back to [`Format::Compact`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `EnvFilter` directive, e.g. `info,wharf_pool=debug`
    pub level: String,
    /// Output format
    pub format: Format,
    /// ANSI colors (ignored for JSON)
    pub ansi: bool,
    /// Include file and line
    pub source: bool,
    /// Include the event target
    pub target: bool,
    /// Service name recorded on a root span
    pub service: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Compact,
            ansi: true,
            source: false,
            target: true,
            service: None,
        }
    }
}

impl Config {
    /// Create configuration from environment variables
    ///
    /// `WHARF_LOG` (falling back to `RUST_LOG`) sets the filter,
    /// `WHARF_LOG_FORMAT` the format, `WHARF_SERVICE` the service name.
    /// `NO_COLOR` disables colors.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::default().overlay(lookup)
    }

    /// Override fields of `self` with whatever the logging variables set.
    ///
    /// Unset variables leave the current value alone.
    #[must_use]
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(level) = lookup("WHARF_LOG").or_else(|| lookup("RUST_LOG")) {
            self.level = level;
        }
        if let Some(format) = lookup("WHARF_LOG_FORMAT") {
            self.format = Format::parse(&format);
        }
        if lookup("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            self.ansi = false;
        }
        if let Some(service) = lookup("WHARF_SERVICE").filter(|s| !s.is_empty()) {
            self.service = Some(service);
        }
        self
    }

    /// Development configuration (pretty, debug level)
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: Format::Pretty,
            source: true,
            ..Self::default()
        }
    }

    /// Production configuration (JSON, info level)
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Json,
            ansi: false,
            ..Self::default()
        }
    }
}
