use super::calculate_ema;

/// MACD line: fast EMA minus slow EMA (conventionally 12/26).
///
/// Only the line itself; the signal-line EMA and histogram are not needed
/// by the feature set.
pub fn calculate_macd(prices: &[f64], fast_period: usize, slow_period: usize) -> Option<f64> {
    if fast_period >= slow_period {
        return None;
    }

    let fast = calculate_ema(prices, fast_period)?;
    let slow = calculate_ema(prices, slow_period)?;
    Some(fast - slow)
}
