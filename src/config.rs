use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{BotError, Result};
use crate::risk::RiskParameters;

/// Runtime settings, layered defaults -> optional TOML file -> `BOT_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub symbols: Vec<String>,
    pub interval: String,
    pub quote_asset: String,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub risk_per_trade: f64,
    pub cycle_secs: u64,
    pub model_path: PathBuf,
    pub log_file: PathBuf,
}

/// Exchange credentials. Environment-only, never from a config file.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    /// Missing credentials abort startup; the control loop must never run
    /// unauthenticated.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("BINANCE_API_KEY")
            .map_err(|_| BotError::Configuration("BINANCE_API_KEY not set".into()))?;
        let api_secret = std::env::var("BINANCE_API_SECRET")
            .map_err(|_| BotError::Configuration("BINANCE_API_SECRET not set".into()))?;

        if api_key.is_empty() || api_secret.is_empty() {
            return Err(BotError::Configuration(
                "exchange credentials must not be empty".into(),
            ));
        }

        Ok(Self {
            api_key,
            api_secret,
        })
    }
}

impl Settings {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("symbols", vec!["BTCUSDT", "ETHUSDT", "BNBUSDT"])
            .and_then(|b| b.set_default("interval", "1h"))
            .and_then(|b| b.set_default("quote_asset", "USDT"))
            .and_then(|b| b.set_default("stop_loss_pct", 0.01))
            .and_then(|b| b.set_default("take_profit_pct", 0.02))
            .and_then(|b| b.set_default("risk_per_trade", 0.01))
            .and_then(|b| b.set_default("cycle_secs", 3600_i64))
            .and_then(|b| b.set_default("model_path", "model.json"))
            .and_then(|b| b.set_default("log_file", "bot.log"))
            .map_err(|e| BotError::Configuration(e.to_string()))?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("BOT")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("symbols"),
            )
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| BotError::Configuration(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(BotError::Configuration("symbol list is empty".into()));
        }
        if self.symbols.iter().any(|s| s.trim().is_empty()) {
            return Err(BotError::Configuration("blank symbol in list".into()));
        }
        if self.interval.is_empty() {
            return Err(BotError::Configuration("interval is empty".into()));
        }
        if self.cycle_secs == 0 {
            return Err(BotError::Configuration("cycle_secs must be > 0".into()));
        }
        self.risk().validate()
    }

    pub fn risk(&self) -> RiskParameters {
        RiskParameters {
            risk_per_trade: self.risk_per_trade,
            stop_loss_pct: self.stop_loss_pct,
            take_profit_pct: self.take_profit_pct,
        }
    }
}
