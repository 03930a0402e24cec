//! `wharf`: run connector operations from the command line.

mod config;
mod invoke;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::invoke::InvokeArgs;

#[derive(Debug, Parser)]
#[command(
    name = "wharf",
    about = "Pooled workflow connectors",
    version,
    propagate_version = true
)]
struct Cli {
    /// Configuration file (default: ./wharf.toml if present)
    #[arg(long, global = true, env = "WHARF_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, overrides the configuration (e.g. `debug`)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one operation and print the response as JSON
    Invoke(InvokeArgs),
    /// List the operations of every hosted connector
    Operations,
    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    let _log = wharf_log::init(&config.log)?;

    match cli.command {
        Command::Invoke(args) => {
            let response = invoke::run(&config, &args).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(if response.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Operations => {
            let pool = wharf_pool::Pool::new(
                wharf_ftp::FtpResource::tcp(config.ftp.clone()),
                config.pool.clone(),
            )?;
            let registry = invoke::registry(pool, &config);
            for service in registry.service_ids() {
                let Some(connector) = registry.get(service) else {
                    continue;
                };
                println!("{service}");
                for op in connector.operations() {
                    println!("  {:<20} {}", op.id, op.summary);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_invoke() {
        let cli = Cli::try_parse_from([
            "wharf",
            "invoke",
            "FTPList",
            "--connection",
            "conn.json",
            "-r",
            "-",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Command::Invoke(args) = cli.command else {
            panic!("expected invoke");
        };
        assert_eq!(args.operation, "FTPList");
        assert_eq!(args.request, PathBuf::from("-"));
        assert_eq!(args.service, wharf_ftp::SERVICE_ID);
    }

    #[test]
    fn invoke_requires_parameter_files() {
        assert!(Cli::try_parse_from(["wharf", "invoke", "FTPList"]).is_err());
    }
}
