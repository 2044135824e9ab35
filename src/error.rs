use thiserror::Error;

/// Failure modes of a trading cycle.
///
/// The first two are recoverable per symbol per cycle: the controller skips
/// the affected symbol and retries on the next tick. Order failures leave
/// position state untouched. `Configuration` is only produced at startup
/// and is fatal.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("market data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("insufficient history: {have} candles, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    #[error("order rejected by exchange: {0}")]
    OrderRejected(String),

    #[error("order submission failed: {0}")]
    OrderSubmissionFault(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BotError {
    pub fn data_unavailable(symbol: impl Into<String>, reason: impl ToString) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.to_string(),
        }
    }

    /// True when the next cycle may simply retry (no state was mutated).
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
