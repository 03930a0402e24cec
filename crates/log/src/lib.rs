//! # Wharf Log
//!
//! Subscriber setup shared by wharf binaries: an [`EnvFilter`] plus one
//! `fmt` layer in pretty, compact, or JSON form, written to stderr.
//!
//! ```rust,no_run
//! let _guard = wharf_log::init(&wharf_log::Config::from_env())?;
//! tracing::info!("ready");
//! # Ok::<(), wharf_log::LogError>(())
//! ```
//!
//! [`EnvFilter`]: tracing_subscriber::EnvFilter

mod builder;
mod config;
mod error;

pub use builder::{LoggerGuard, init};
pub use config::{Config, Format};
pub use error::{LogError, LogResult};
