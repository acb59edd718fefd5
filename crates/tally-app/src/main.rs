//! tally - live portfolio and working-order aggregator.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Live portfolio and working-order aggregator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TALLY_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tally_telemetry::init_logging()?;

    info!("Starting tally v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > TALLY_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("TALLY_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = tally_app::AppConfig::from_file(&config_path)?;

    let app = tally_app::Application::new(config);
    app.run().await?;

    Ok(())
}
