use std::sync::Arc;

use crate::api::MarketData;
use crate::error::Result;
use crate::models::{CandleWindow, WINDOW_SIZE};

/// Fetches and normalizes candle windows for the controller.
///
/// Any upstream failure surfaces as DataUnavailable; the caller treats it
/// as "skip this symbol this cycle", never as fatal.
pub struct MarketFeed {
    source: Arc<dyn MarketData>,
    interval: String,
}

impl MarketFeed {
    pub fn new(source: Arc<dyn MarketData>, interval: impl Into<String>) -> Self {
        Self {
            source,
            interval: interval.into(),
        }
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }

    /// The most recent window, validated (ascending timestamps, capped at
    /// [`WINDOW_SIZE`]).
    pub async fn fetch(&self, symbol: &str) -> Result<CandleWindow> {
        let candles = self
            .source
            .klines(symbol, &self.interval, WINDOW_SIZE)
            .await?;

        CandleWindow::new(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BotError;
    use crate::models::Candle;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    struct FixedSource {
        candles: Vec<Candle>,
    }

    #[async_trait]
    impl MarketData for FixedSource {
        async fn klines(
            &self,
            _symbol: &str,
            _interval: &str,
            _limit: usize,
        ) -> Result<Vec<Candle>> {
            Ok(self.candles.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl MarketData for FailingSource {
        async fn klines(
            &self,
            symbol: &str,
            _interval: &str,
            _limit: usize,
        ) -> Result<Vec<Candle>> {
            Err(BotError::data_unavailable(symbol, "connection refused"))
        }
    }

    fn candle_at(secs: i64, close: f64) -> Candle {
        Candle {
            symbol: "BTCUSDT".to_string(),
            open_time: Utc.timestamp_opt(secs, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 500.0,
        }
    }

    #[tokio::test]
    async fn test_fetch_wraps_candles_in_window() {
        let candles: Vec<Candle> = (0..10).map(|i| candle_at(i * 3600, 100.0 + i as f64)).collect();
        let feed = MarketFeed::new(Arc::new(FixedSource { candles }), "1h");

        let window = feed.fetch("BTCUSDT").await.unwrap();
        assert_eq!(window.len(), 10);
        assert_eq!(window.last_close(), Some(109.0));
    }

    #[tokio::test]
    async fn test_fetch_propagates_unavailable() {
        let feed = MarketFeed::new(Arc::new(FailingSource), "1h");
        let err = feed.fetch("BTCUSDT").await.unwrap_err();
        assert!(matches!(err, BotError::DataUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_fetch_rejects_disordered_payload() {
        let candles = vec![candle_at(7200, 101.0), candle_at(3600, 100.0)];
        let feed = MarketFeed::new(Arc::new(FixedSource { candles }), "1h");
        assert!(feed.fetch("BTCUSDT").await.is_err());
    }
}
