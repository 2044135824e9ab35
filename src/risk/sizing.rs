use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};

/// Decimal places orders are rounded to. A production deployment would
/// read the lot-size filter per symbol; one fixed precision covers the
/// majors this bot trades.
pub const QUANTITY_SCALE: u32 = 6;

/// Process-wide risk limits, fixed at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskParameters {
    /// Fraction of the account balance at risk per trade
    pub risk_per_trade: f64,
    /// Stop-loss distance as a fraction of entry price
    pub stop_loss_pct: f64,
    /// Take-profit distance as a fraction of entry price
    pub take_profit_pct: f64,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            risk_per_trade: 0.01,  // 1% of balance
            stop_loss_pct: 0.01,   // -1% from entry
            take_profit_pct: 0.02, // +2% from entry
        }
    }
}

impl RiskParameters {
    pub fn validate(&self) -> Result<()> {
        if !(self.risk_per_trade > 0.0 && self.risk_per_trade < 1.0) {
            return Err(BotError::Configuration(format!(
                "risk_per_trade must be in (0, 1), got {}",
                self.risk_per_trade
            )));
        }
        if self.stop_loss_pct <= 0.0 {
            return Err(BotError::Configuration(format!(
                "stop_loss_pct must be positive, got {}",
                self.stop_loss_pct
            )));
        }
        if self.take_profit_pct <= 0.0 {
            return Err(BotError::Configuration(format!(
                "take_profit_pct must be positive, got {}",
                self.take_profit_pct
            )));
        }
        Ok(())
    }

    /// Stop-loss price for a long entered at `entry_price`
    pub fn stop_price(&self, entry_price: f64) -> f64 {
        entry_price * (1.0 - self.stop_loss_pct)
    }

    /// Take-profit price for a long entered at `entry_price`
    pub fn target_price(&self, entry_price: f64) -> f64 {
        entry_price * (1.0 + self.take_profit_pct)
    }
}

/// Size an order so that a stop-out loses `risk_fraction` of the balance.
///
/// quantity = balance * risk_fraction / |entry - stop|, rounded to
/// [`QUANTITY_SCALE`] decimal places. The stop distance is strictly
/// positive by construction (stop = entry * (1 - SL%) with SL% > 0).
pub fn position_size(balance: f64, risk_fraction: f64, entry_price: f64, stop_price: f64) -> f64 {
    let risk_amount = balance * risk_fraction;
    let stop_distance = (entry_price - stop_price).abs();
    let raw = risk_amount / stop_distance;

    Decimal::from_f64(raw)
        .map(|q| q.round_dp(QUANTITY_SCALE))
        .and_then(|q| q.to_f64())
        .unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_sizing() {
        // 1% of 10000 = 100 at risk; stop distance 1 => quantity 100
        let quantity = position_size(10_000.0, 0.01, 100.0, 99.0);
        assert_eq!(quantity, 100.0);
    }

    #[test]
    fn test_wider_stop_shrinks_quantity() {
        let tight = position_size(10_000.0, 0.01, 100.0, 99.0);
        let wide = position_size(10_000.0, 0.01, 100.0, 95.0);
        assert!(wide < tight);
        assert_eq!(wide, 20.0); // 100 / 5
    }

    #[test]
    fn test_rounds_to_six_decimals() {
        // 100 / 3 = 33.333333...
        let quantity = position_size(10_000.0, 0.01, 100.0, 97.0);
        assert_eq!(quantity, 33.333333);
    }

    #[test]
    fn test_stop_and_target_prices() {
        let risk = RiskParameters::default();
        assert!((risk.stop_price(100.0) - 99.0).abs() < 1e-9);
        assert!((risk.target_price(100.0) - 102.0).abs() < 1e-9);
    }

    #[test]
    fn test_validation_bounds() {
        assert!(RiskParameters::default().validate().is_ok());

        let bad_risk = RiskParameters {
            risk_per_trade: 1.5,
            ..Default::default()
        };
        assert!(bad_risk.validate().is_err());

        let zero_risk = RiskParameters {
            risk_per_trade: 0.0,
            ..Default::default()
        };
        assert!(zero_risk.validate().is_err());

        let bad_stop = RiskParameters {
            stop_loss_pct: 0.0,
            ..Default::default()
        };
        assert!(bad_stop.validate().is_err());

        let bad_target = RiskParameters {
            take_profit_pct: -0.02,
            ..Default::default()
        };
        assert!(bad_target.validate().is_err());
    }
}
