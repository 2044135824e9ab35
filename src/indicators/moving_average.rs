/// Simple Moving Average over the most recent `period` prices
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let tail = &prices[prices.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}

/// Exponential Moving Average, seeded with the SMA of the first `period`
/// prices and rolled forward over the remainder of the series.
pub fn calculate_ema(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = prices[..period].iter().sum::<f64>() / period as f64;

    let ema = prices[period..]
        .iter()
        .fold(seed, |ema, price| ema + alpha * (price - ema));

    Some(ema)
}
