pub mod binance;
pub mod paper;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Candle, OrderFill, Side};

pub use binance::BinanceClient;
pub use paper::PaperGateway;

/// Market data source: most-recent candles in ascending time order
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn klines(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>>;
}

/// Account source: free (non-reserved) balance of an asset
#[async_trait]
pub trait AccountSource: Send + Sync {
    async fn free_balance(&self, asset: &str) -> Result<f64>;
}

/// Order sink: market orders only, confirmed fill or typed failure
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn market_order(&self, symbol: &str, side: Side, quantity: f64) -> Result<OrderFill>;
}
