// Technical indicators module
// Implements the rolling indicators the feature engine needs: SMA/EMA,
// RSI, MACD line, Bollinger bands

pub mod bollinger;
pub mod macd;
pub mod moving_average;
pub mod rsi;

pub use bollinger::{calculate_bollinger, BollingerBands};
pub use macd::calculate_macd;
pub use moving_average::{calculate_ema, calculate_sma};
pub use rsi::calculate_rsi;
