use crate::error::{BotError, Result};
use crate::indicators::{calculate_bollinger, calculate_macd, calculate_rsi, calculate_sma};
use crate::models::{CandleWindow, FeatureVector};

/// Indicator periods for feature derivation
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    pub sma_short_period: usize,
    pub sma_long_period: usize,
    pub rsi_period: usize,
    pub macd_fast_period: usize,
    pub macd_slow_period: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sma_short_period: 50,
            sma_long_period: 200,
            rsi_period: 14,
            macd_fast_period: 12,
            macd_slow_period: 26,
            bollinger_period: 20,
            bollinger_k: 2.0,
        }
    }
}

impl FeatureConfig {
    /// Candles needed before every indicator in the set is defined.
    ///
    /// RSI needs one extra change beyond its period; the long SMA dominates
    /// with the default configuration.
    pub fn min_candles(&self) -> usize {
        self.sma_long_period
            .max(self.sma_short_period)
            .max(self.rsi_period + 1)
            .max(self.macd_slow_period)
            .max(self.bollinger_period)
    }
}

/// Derives the model's feature vector from a candle window.
///
/// Mirrors "compute rolling indicators, drop undefined rows, keep the last
/// one": only the newest row is ever emitted, and it is only emitted once
/// every rolling window has filled.
#[derive(Debug, Clone, Default)]
pub struct FeatureEngine {
    config: FeatureConfig,
}

impl FeatureEngine {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn min_candles(&self) -> usize {
        self.config.min_candles()
    }

    pub fn derive(&self, window: &CandleWindow) -> Result<FeatureVector> {
        let need = self.min_candles();
        if window.len() < need {
            return Err(BotError::InsufficientHistory {
                have: window.len(),
                need,
            });
        }

        let closes = window.closes();
        let insufficient = || BotError::InsufficientHistory {
            have: closes.len(),
            need,
        };

        let c = &self.config;
        let sma_short = calculate_sma(&closes, c.sma_short_period).ok_or_else(insufficient)?;
        let sma_long = calculate_sma(&closes, c.sma_long_period).ok_or_else(insufficient)?;
        let rsi = calculate_rsi(&closes, c.rsi_period).ok_or_else(insufficient)?;
        let macd = calculate_macd(&closes, c.macd_fast_period, c.macd_slow_period)
            .ok_or_else(insufficient)?;
        let bands = calculate_bollinger(&closes, c.bollinger_period, c.bollinger_k)
            .ok_or_else(insufficient)?;

        // closes is non-empty here: len >= need >= 1
        let close = *closes.last().ok_or_else(insufficient)?;

        Ok(FeatureVector {
            close,
            sma_short,
            sma_long,
            rsi,
            macd,
            bollinger_upper: bands.upper,
            bollinger_lower: bands.lower,
        })
    }
}

/// Default engine covers exactly one full window
pub fn default_min_candles() -> usize {
    FeatureConfig::default().min_candles()
}
