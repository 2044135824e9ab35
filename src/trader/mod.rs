use std::sync::Arc;

use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::api::AccountSource;
use crate::error::Result;
use crate::execution::{decide, PositionBook, TradeExecutor};
use crate::features::FeatureEngine;
use crate::feed::MarketFeed;
use crate::oracle::SignalModel;
use crate::risk::RiskParameters;

/// Wait before re-checking the balance when the snapshot fetch fails
const BALANCE_RETRY_SECS: u64 = 60;

/// Outcome of one controller pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    /// The quote-asset balance could not be fetched; no symbol was
    /// processed and no state changed
    BalanceUnavailable,
}

/// The outer loop: one balance snapshot per cycle, then a strictly
/// sequential pass over all symbols.
///
/// Each symbol's failure is contained to that symbol; the position book is
/// owned here and only mutated through the executor on confirmed fills.
/// [`Controller::run_cycle`] is a single pass so tests can drive cycles
/// without timers.
pub struct Controller {
    feed: MarketFeed,
    account: Arc<dyn AccountSource>,
    executor: TradeExecutor,
    engine: FeatureEngine,
    model: Arc<dyn SignalModel>,
    risk: RiskParameters,
    symbols: Vec<String>,
    quote_asset: String,
    book: PositionBook,
}

impl Controller {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        feed: MarketFeed,
        account: Arc<dyn AccountSource>,
        executor: TradeExecutor,
        engine: FeatureEngine,
        model: Arc<dyn SignalModel>,
        risk: RiskParameters,
        symbols: Vec<String>,
        quote_asset: String,
    ) -> Self {
        Self {
            feed,
            account,
            executor,
            engine,
            model,
            risk,
            symbols,
            quote_asset,
            book: PositionBook::new(),
        }
    }

    pub fn book(&self) -> &PositionBook {
        &self.book
    }

    /// Run forever: a cycle per tick, sleeping the configured interval in
    /// between. Ticks that land while a cycle is still running are
    /// skipped rather than queued.
    pub async fn run(&mut self, cycle: Duration) {
        let mut ticker = interval(cycle);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            while self.run_cycle().await == CycleOutcome::BalanceUnavailable {
                tracing::warn!(
                    "Balance unavailable, retrying in {}s",
                    BALANCE_RETRY_SECS
                );
                tokio::time::sleep(Duration::from_secs(BALANCE_RETRY_SECS)).await;
            }
        }
    }

    /// One pass over all configured symbols
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let balance = match self.account.free_balance(&self.quote_asset).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::error!("Failed to fetch {} balance: {}", self.quote_asset, e);
                return CycleOutcome::BalanceUnavailable;
            }
        };

        tracing::info!(
            balance = %format!("{balance:.2}"),
            asset = %self.quote_asset,
            "Cycle start"
        );

        for symbol in self.symbols.clone() {
            if let Err(e) = self.process_symbol(&symbol, balance).await {
                tracing::warn!(symbol = %symbol, "Skipped this cycle: {}", e);
            }
        }

        tracing::info!(
            open_positions = self.book.open_count(),
            "Cycle complete"
        );

        CycleOutcome::Completed
    }

    /// Fetch, derive, predict, decide, execute for one symbol.
    ///
    /// Any error skips the symbol with its prior position carried over
    /// unchanged.
    async fn process_symbol(&mut self, symbol: &str, balance: f64) -> Result<()> {
        let window = self.feed.fetch(symbol).await?;
        let features = self.engine.derive(&window)?;
        let signal = self.model.predict(&features);
        let price = features.close;

        let decision = decide(self.book.position(symbol), signal, price, balance, &self.risk);

        tracing::info!(
            symbol = %symbol,
            price = %format!("{price:.4}"),
            signal = ?signal,
            "Decision: {}",
            decision.reason
        );

        self.executor
            .apply(&mut self.book, symbol, price, &decision)
            .await?;

        Ok(())
    }
}
