//! Application configuration: defaults, then `wharf.toml`, then `WHARF_*`.

use std::path::Path;

use anyhow::{Context, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use wharf_ftp::FtpConfig;
use wharf_pool::PoolConfig;

/// File read when `--config` is not given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "wharf.toml";

/// Everything the binary can be configured with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: wharf_log::Config,
    pub pool: PoolConfig,
    pub ftp: FtpConfig,
}

impl AppConfig {
    /// Provider stack for `path` (or [`DEFAULT_CONFIG_FILE`]).
    ///
    /// Nested keys come from the environment as `WHARF_POOL__CAPACITY=8`.
    /// The flat logging variables (`WHARF_LOG`, `WHARF_LOG_FORMAT`,
    /// `WHARF_SERVICE`) are left to [`wharf_log::Config::overlay`].
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.map_or_else(|| Toml::file(DEFAULT_CONFIG_FILE), Toml::file);
        Figment::from(Serialized::defaults(Self::default()))
            .merge(file)
            .merge(
                Env::prefixed("WHARF_")
                    .ignore(&["log", "log_format", "service"])
                    .split("__"),
            )
    }

    /// Extract and validate.
    pub fn from_figment(figment: &Figment) -> anyhow::Result<Self> {
        let config: Self = figment.extract().context("invalid configuration")?;
        config
            .pool
            .validate()
            .context("invalid [pool] configuration")?;
        Ok(config)
    }

    /// Load the configuration the binary runs with.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path
            && !path.is_file()
        {
            bail!("config file {} does not exist", path.display());
        }
        let mut config = Self::from_figment(&Self::figment(path))?;
        config.log = config.log.overlay(|name| std::env::var(name).ok());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use wharf_pool::AbandonPolicy;

    fn with_toml(toml: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(toml))
    }

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::from_figment(&with_toml("")).unwrap();
        assert_eq!(config.pool.capacity, PoolConfig::default().capacity);
        assert_eq!(config.ftp, FtpConfig::default());
        assert_eq!(config.log, wharf_log::Config::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let config = AppConfig::from_figment(&with_toml(
            r#"
            [pool]
            capacity = 8
            abandon_policy = "retry"

            [pool.acquire_timeout]
            secs = 5

            [ftp]
            compress_threshold = 1024

            [log]
            format = "json"
            "#,
        ))
        .unwrap();

        assert_eq!(config.pool.capacity, 8);
        assert_eq!(config.pool.abandon_policy, AbandonPolicy::Retry);
        assert_eq!(config.pool.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.pool.drain_timeout, PoolConfig::default().drain_timeout);
        assert_eq!(config.ftp.compress_threshold, 1024);
        assert_eq!(config.log.format, wharf_log::Format::Json);
    }

    #[test]
    fn rejects_zero_capacity() {
        let err = AppConfig::from_figment(&with_toml("[pool]\ncapacity = 0")).unwrap_err();
        assert!(format!("{err:#}").contains("capacity"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/definitely/not/here/wharf.toml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
