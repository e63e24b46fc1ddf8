//! Order-book-imbalance taker bot - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Order-book-imbalance taker bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via OBI_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    obi_bot::logging::init_logging();

    info!("Starting obi-bot v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > OBI_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("OBI_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let config = obi_bot::AppConfig::from_file(&config_path)?;
    info!(
        base_url = %config.base_url,
        markets = config.markets.len(),
        "Configuration loaded"
    );

    let app = obi_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
