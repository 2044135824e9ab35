use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Per-symbol position state. Flat and Long are mutually exclusive by
/// construction; everything a close-side order needs (most importantly the
/// held quantity) lives on the Long state, so an exit can never reuse a
/// stale sizing from an earlier entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    Flat,
    Long {
        entry_price: f64,
        quantity: f64,
        stop_loss: f64,
        take_profit: f64,
        opened_at: DateTime<Utc>,
    },
}

impl Position {
    pub fn is_long(&self) -> bool {
        matches!(self, Position::Long { .. })
    }
}

static FLAT: Position = Position::Flat;

/// Owned map from symbol to position.
///
/// Exclusively owned by the controller; state only moves through
/// [`PositionBook::record_entry`] and [`PositionBook::record_exit`], which
/// the executor calls after a confirmed fill. A symbol never seen before
/// reads as Flat.
#[derive(Debug, Default)]
pub struct PositionBook {
    positions: HashMap<String, Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, symbol: &str) -> &Position {
        self.positions.get(symbol).unwrap_or(&FLAT)
    }

    pub fn is_long(&self, symbol: &str) -> bool {
        self.position(symbol).is_long()
    }

    pub fn open_count(&self) -> usize {
        self.positions.values().filter(|p| p.is_long()).count()
    }

    /// Record a confirmed BUY. Must only be called from Flat.
    pub fn record_entry(
        &mut self,
        symbol: &str,
        entry_price: f64,
        quantity: f64,
        stop_loss: f64,
        take_profit: f64,
    ) {
        debug_assert!(
            !self.is_long(symbol),
            "entry recorded for {symbol} while already long"
        );

        self.positions.insert(
            symbol.to_string(),
            Position::Long {
                entry_price,
                quantity,
                stop_loss,
                take_profit,
                opened_at: Utc::now(),
            },
        );
    }

    /// Record a confirmed SELL, returning the symbol to Flat with no
    /// residual stop/target values.
    pub fn record_exit(&mut self, symbol: &str) {
        debug_assert!(
            self.is_long(symbol),
            "exit recorded for {symbol} while flat"
        );

        self.positions.insert(symbol.to_string(), Position::Flat);
    }
}
