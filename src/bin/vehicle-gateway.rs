use std::time::Duration;

use anyhow::{Context, Result};
use clap::arg;
use clap::command;
use clap::Parser;
use reqwest::Client;
use tracing::info;
use vehicle_gateway::server;
use vehicle_gateway::utils::config_loader;
use vehicle_gateway::utils::logging;
use vehicle_gateway::utils::logging::LogLevel;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "vehicle-gateway.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // -------------------------------
    // 1. Load YAML config, init logging
    // -------------------------------

    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level.to_owned()).await?;

    // -------------------------------
    // 2. Create request client
    // -------------------------------

    let client = Client::builder()
        .timeout(Duration::from_millis(service_config.settings.request_timeout_ms))
        .build()
        .context("failed to build HTTP client")?;

    // -------------------------------
    // 3. Serve vehicle API and static files
    // -------------------------------

    info!(
        "Service starting, sandbox: {}, static dir: {}",
        service_config.settings.sandbox, service_config.settings.static_dir
    );
    server::server::start(&service_config, &client).await?;

    Ok(())
}
