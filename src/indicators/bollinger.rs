use super::calculate_sma;

/// Upper and lower Bollinger bands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub lower: f64,
}

/// Bollinger bands: rolling mean ± `k` standard deviations over the most
/// recent `period` prices (conventionally 20 periods, k = 2).
///
/// Uses the population standard deviation of the window, matching the
/// usual charting definition.
pub fn calculate_bollinger(prices: &[f64], period: usize, k: f64) -> Option<BollingerBands> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let mean = calculate_sma(prices, period)?;
    let tail = &prices[prices.len() - period..];
    let variance = tail.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();

    Some(BollingerBands {
        upper: mean + k * std_dev,
        lower: mean - k * std_dev,
    })
}
