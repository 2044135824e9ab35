use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::time::Duration;
use tracing_subscriber::EnvFilter;

use quantbot::api::{AccountSource, BinanceClient, MarketData, OrderGateway, PaperGateway};
use quantbot::config::{Credentials, Settings};
use quantbot::execution::TradeExecutor;
use quantbot::features::FeatureEngine;
use quantbot::feed::MarketFeed;
use quantbot::oracle::LogisticModel;
use quantbot::trader::Controller;

/// Model-driven spot trading bot for Binance pairs
#[derive(Debug, Parser)]
#[command(name = "quantbot", version)]
struct Args {
    /// Path to a TOML settings file (layered under BOT_* env vars)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured symbol list
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Confirm fills without touching the exchange
    #[arg(long)]
    paper: bool,

    /// Log to stdout instead of the configured log file
    #[arg(long)]
    log_stdout: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut settings =
        Settings::load(args.config.as_deref()).context("loading configuration")?;
    if !args.symbols.is_empty() {
        settings.symbols = args.symbols.clone();
        settings.validate().context("validating symbol override")?;
    }

    setup_logging(&settings, args.log_stdout)?;

    tracing::info!("🚀 quantbot starting");

    // Credentials are required even for paper runs: market data and the
    // balance snapshot still come from the exchange
    let credentials = Credentials::from_env().context("reading exchange credentials")?;
    let client = BinanceClient::new(credentials).context("building exchange client")?;

    let model = Arc::new(
        LogisticModel::from_file(&settings.model_path).context("loading signal model")?,
    );

    tracing::info!("📊 Configuration:");
    tracing::info!("  Symbols: {}", settings.symbols.join(", "));
    tracing::info!("  Interval: {}", settings.interval);
    tracing::info!("  Stop-loss: {}%", settings.stop_loss_pct * 100.0);
    tracing::info!("  Take-profit: {}%", settings.take_profit_pct * 100.0);
    tracing::info!("  Risk per trade: {}%", settings.risk_per_trade * 100.0);
    tracing::info!("  Cycle: {}s", settings.cycle_secs);
    tracing::info!("  Mode: {}", if args.paper { "paper" } else { "live" });

    let market: Arc<dyn MarketData> = Arc::new(client.clone());
    let account: Arc<dyn AccountSource> = Arc::new(client.clone());
    let gateway: Arc<dyn OrderGateway> = if args.paper {
        Arc::new(PaperGateway::new())
    } else {
        Arc::new(client)
    };

    let mut controller = Controller::new(
        MarketFeed::new(market, settings.interval.clone()),
        account,
        TradeExecutor::new(gateway),
        FeatureEngine::default(),
        model,
        settings.risk(),
        settings.symbols.clone(),
        settings.quote_asset.clone(),
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("⚠️  Received Ctrl+C, shutting down...");
        }
        _ = controller.run(Duration::from_secs(settings.cycle_secs)) => {}
    }

    tracing::info!("👋 quantbot stopped");
    Ok(())
}

fn setup_logging(settings: &Settings, log_stdout: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quantbot=info"));

    if log_stdout {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(());
    }

    // The append-only log file is the sole persisted artifact of a run
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)
        .with_context(|| format!("opening log file {}", settings.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
