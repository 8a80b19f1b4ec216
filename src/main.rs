//! healthcast - dependency health aggregation service
//!
//! Serves `/health`, `/health/detailed` and the `/health/ws` realtime
//! channel.

#![allow(missing_docs)]

use anyhow::Context;
use clap::Parser;
use healthcast::server::builder::{DEFAULT_CONFIG_PATH, load_config, run_server};
use healthcast::utils::logging::init_logging;
use std::path::PathBuf;
use std::process::ExitCode;

/// Command line arguments; every flag overrides the file and environment
#[derive(Debug, Parser)]
#[command(name = "healthcast", version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long, env = "HEALTHCAST_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Bind host
    #[arg(long, env = "HEALTHCAST_HOST")]
    host: Option<String>,

    /// Bind port
    #[arg(short, long, env = "HEALTHCAST_PORT")]
    port: Option<u16>,

    /// Log level directive, e.g. `info` or `healthcast=debug`
    #[arg(long, env = "HEALTHCAST_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long, env = "HEALTHCAST_LOG_JSON")]
    json_logs: bool,
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(&args.config)
        .await
        .with_context(|| format!("Failed to load configuration from {:?}", args.config))?;

    if let Some(host) = args.host {
        config.app.server.host = host;
    }
    if let Some(port) = args.port {
        config.app.server.port = port;
    }
    if let Some(level) = args.log_level {
        config.app.logging.level = level;
    }
    if args.json_logs {
        config.app.logging.json = true;
    }
    config.validate().context("Invalid configuration")?;

    init_logging(config.logging());
    run_server(config).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is not an error; load it before clap reads the env
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Display keeps the context chain readable
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
