//! Swing trade-cycle bot - entry point.

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use swing_broker::{DynBroker, RestBroker, RestConfig};

/// Single-ticker automated trade-cycle bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via SWINGBOT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Ticker to trade (overrides the config file)
    #[arg(short, long)]
    ticker: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    swing_bot::init_logging()?;

    info!("Starting swing-bot v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => swing_bot::AppConfig::from_file(path)?,
        None => {
            let config = swing_bot::AppConfig::load()?;
            config.validate()?;
            config
        }
    };

    let ticker = match args.ticker.or_else(|| config.ticker.clone()) {
        Some(ticker) => ticker.to_uppercase(),
        None => prompt_ticker()?,
    };
    info!(ticker, "trading ticker selected");

    let broker_config = config.broker.clone().unwrap_or_else(RestConfig::from_env);
    if broker_config.api_key_id.is_empty() || broker_config.api_secret_key.is_empty() {
        bail!("broker credentials missing: set [broker] in the config file or APCA_API_KEY_ID/APCA_API_SECRET_KEY");
    }
    let broker: DynBroker = Arc::new(RestBroker::new(broker_config)?);

    let orchestrator = swing_bot::TradeOrchestrator::new(broker, ticker, config);
    orchestrator.startup().await?;
    orchestrator.run().await?;

    Ok(())
}

fn prompt_ticker() -> Result<String> {
    print!("Enter ticker symbol: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read ticker from stdin")?;

    let ticker = line.trim().to_uppercase();
    if ticker.is_empty() {
        bail!("no ticker provided");
    }
    Ok(ticker)
}
