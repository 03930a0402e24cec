//! Subscriber installation

use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, Format};
use crate::error::{LogError, LogResult};

/// Guard that keeps the root span entered
///
/// Hold it for the lifetime of the program.
#[derive(Debug)]
pub struct LoggerGuard {
    #[allow(dead_code)]
    root_span: Option<tracing::span::EnteredSpan>,
}

/// Build a `fmt` layer with the options shared by every format.
macro_rules! create_fmt_layer {
    ($layer:expr, $config:expr) => {
        $layer
            .with_writer(std::io::stderr)
            .with_target($config.target)
            .with_file($config.source)
            .with_line_number($config.source)
    };
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Returns error if:
/// - the filter directive cannot be parsed
/// - a global subscriber is already installed
pub fn init(config: &Config) -> LogResult<LoggerGuard> {
    let filter = EnvFilter::try_new(&config.level).map_err(|e| LogError::Filter {
        directive: config.level.clone(),
        message: e.to_string(),
    })?;
    let subscriber = Registry::default().with(filter);

    let installed = match config.format {
        Format::Pretty => subscriber
            .with(create_fmt_layer!(fmt::layer().pretty(), config).with_ansi(config.ansi))
            .try_init(),
        Format::Compact => subscriber
            .with(create_fmt_layer!(fmt::layer().compact(), config).with_ansi(config.ansi))
            .try_init(),
        Format::Json => subscriber
            .with(
                create_fmt_layer!(fmt::layer().json(), config)
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .try_init(),
    };
    installed.map_err(|e| LogError::AlreadyInitialized(e.to_string()))?;

    let root_span = config
        .service
        .as_deref()
        .map(|service| tracing::info_span!("app", service).entered());

    Ok(LoggerGuard { root_span })
}
