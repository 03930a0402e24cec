//! One-shot operation invocation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncReadExt;
use wharf_connector::{ConnectorRegistry, Parameters, Response};
use wharf_ftp::{FsBlobStore, FtpConnector, FtpResource};
use wharf_pool::Pool;

use crate::config::AppConfig;

/// Arguments of `wharf invoke`.
#[derive(Debug, Clone, clap::Args)]
pub struct InvokeArgs {
    /// Operation id, e.g. `FTPList`
    pub operation: String,

    /// JSON file with the connection parameters
    #[arg(short, long)]
    pub connection: PathBuf,

    /// JSON file with the request parameters (`-` reads stdin)
    #[arg(short, long)]
    pub request: PathBuf,

    /// Service provider id
    #[arg(long, default_value = wharf_ftp::SERVICE_ID)]
    pub service: String,
}

/// Every connector this binary hosts, sharing `pool`.
pub fn registry(pool: Pool<FtpResource>, config: &AppConfig) -> ConnectorRegistry {
    let mut registry = ConnectorRegistry::new();
    registry.register(Arc::new(FtpConnector::new(
        pool,
        Arc::new(FsBlobStore::new()),
        config.ftp.clone(),
    )));
    registry
}

async fn read_parameters(path: &Path) -> anyhow::Result<Parameters> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        tokio::io::stdin().read_to_string(&mut raw).await?;
        raw
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON object", path.display()))
}

/// Run one operation and shut the pool down afterwards.
pub async fn run(config: &AppConfig, args: &InvokeArgs) -> anyhow::Result<Response> {
    let connection = read_parameters(&args.connection).await?;
    let request = read_parameters(&args.request).await?;

    let pool = Pool::new(FtpResource::tcp(config.ftp.clone()), config.pool.clone())
        .context("failed to create session pool")?;
    let registry = registry(pool.clone(), config);

    let result = match registry.get(&args.service) {
        Some(connector) => {
            tracing::debug!(service = %args.service, operation = %args.operation, "invoking");
            Ok(connector.invoke(&args.operation, &connection, &request).await)
        }
        None => Err(anyhow::anyhow!(
            "unknown service '{}', known: {}",
            args.service,
            registry.service_ids().join(", ")
        )),
    };

    if let Err(error) = pool.shutdown().await {
        tracing::warn!(%error, "pool did not shut down cleanly");
    }
    result
}
