use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};

/// Maximum candles kept per window; also the longest indicator lookback.
pub const WINDOW_SIZE: usize = 200;

/// One OHLCV candlestick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A fixed-size window of candles, newest last.
///
/// Construction enforces the two invariants everything downstream relies
/// on: timestamps strictly increase, and at most [`WINDOW_SIZE`] candles
/// are kept (the oldest are dropped).
#[derive(Debug, Clone)]
pub struct CandleWindow {
    candles: Vec<Candle>,
}

impl CandleWindow {
    pub fn new(mut candles: Vec<Candle>) -> Result<Self> {
        for pair in candles.windows(2) {
            if pair[1].open_time <= pair[0].open_time {
                return Err(BotError::data_unavailable(
                    pair[0].symbol.clone(),
                    format!(
                        "candles out of order at {} -> {}",
                        pair[0].open_time, pair[1].open_time
                    ),
                ));
            }
        }
        if candles.len() > WINDOW_SIZE {
            candles.drain(..candles.len() - WINDOW_SIZE);
        }
        Ok(Self { candles })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Close prices, oldest first
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// The last close is the cycle's "current price".
    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }
}

/// Binary output of the signal model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// Bullish: open a long if flat
    Enter,
    /// Bearish or neutral: close a long if open
    Exit,
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Exchange wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

/// Confirmed execution reported by the order sink
#[derive(Debug, Clone)]
pub struct OrderFill {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    /// Average fill price when the venue reports one (paper fills don't)
    pub price: Option<f64>,
    pub order_id: String,
}

/// Inputs to the signal model, one value per indicator.
///
/// The model consumes these as a fixed-order array; [`FeatureVector::to_array`]
/// defines that order and must stay in sync with the trained artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub close: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    pub rsi: f64,
    pub macd: f64,
    pub bollinger_upper: f64,
    pub bollinger_lower: f64,
}

impl FeatureVector {
    pub const ARITY: usize = 7;

    /// Order: close, SMA-short, SMA-long, RSI, MACD, Bollinger upper, Bollinger lower
    pub fn to_array(&self) -> [f64; Self::ARITY] {
        [
            self.close,
            self.sma_short,
            self.sma_long,
            self.rsi,
            self.macd,
            self.bollinger_upper,
            self.bollinger_lower,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle_at(secs: i64, close: f64) -> Candle {
        Candle {
            symbol: "BTCUSDT".to_string(),
            open_time: Utc.timestamp_opt(secs, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn test_window_orders_and_caps() {
        let candles: Vec<Candle> = (0..250).map(|i| candle_at(i * 3600, 100.0 + i as f64)).collect();
        let window = CandleWindow::new(candles).unwrap();

        assert_eq!(window.len(), WINDOW_SIZE);
        // Oldest 50 dropped, newest kept
        assert_eq!(window.last_close(), Some(349.0));
        assert_eq!(window.closes()[0], 150.0);
    }

    #[test]
    fn test_window_rejects_unsorted_candles() {
        let candles = vec![candle_at(7200, 101.0), candle_at(3600, 100.0)];
        let result = CandleWindow::new(candles);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("out of order"));
    }

    #[test]
    fn test_window_rejects_duplicate_timestamps() {
        let candles = vec![candle_at(3600, 100.0), candle_at(3600, 101.0)];
        assert!(CandleWindow::new(candles).is_err());
    }

    #[test]
    fn test_empty_window_has_no_price() {
        let window = CandleWindow::new(Vec::new()).unwrap();
        assert!(window.is_empty());
        assert_eq!(window.last_close(), None);
    }

    #[test]
    fn test_side_wire_format() {
        assert_eq!(Side::Buy.as_str(), "BUY");
        assert_eq!(Side::Sell.as_str(), "SELL");
    }

    #[test]
    fn test_feature_array_order() {
        let features = FeatureVector {
            close: 1.0,
            sma_short: 2.0,
            sma_long: 3.0,
            rsi: 4.0,
            macd: 5.0,
            bollinger_upper: 6.0,
            bollinger_lower: 7.0,
        };
        assert_eq!(features.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }
}
