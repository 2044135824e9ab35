use std::sync::Arc;

use crate::api::OrderGateway;
use crate::error::Result;
use crate::execution::{Decision, PositionBook, TradeAction};
use crate::models::{OrderFill, Side};

/// Carries a decision through the order gateway and advances the book.
///
/// State moves only on a confirmed fill. A rejected or failed submission
/// propagates its typed error and leaves the book exactly as it was, so
/// the tracked position can never diverge from the real held position.
pub struct TradeExecutor {
    gateway: Arc<dyn OrderGateway>,
}

impl TradeExecutor {
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        Self { gateway }
    }

    pub async fn apply(
        &self,
        book: &mut PositionBook,
        symbol: &str,
        price: f64,
        decision: &Decision,
    ) -> Result<Option<OrderFill>> {
        match &decision.action {
            TradeAction::Hold => Ok(None),

            TradeAction::OpenLong {
                quantity,
                stop_loss,
                take_profit,
            } => {
                let fill = self
                    .gateway
                    .market_order(symbol, Side::Buy, *quantity)
                    .await?;

                book.record_entry(symbol, price, *quantity, *stop_loss, *take_profit);

                tracing::info!(
                    symbol = %symbol,
                    entry = %price,
                    quantity = %quantity,
                    stop_loss = %stop_loss,
                    take_profit = %take_profit,
                    fill_price = ?fill.price,
                    order_id = %fill.order_id,
                    "Opened long position"
                );

                Ok(Some(fill))
            }

            TradeAction::CloseLong { quantity, reason } => {
                let fill = self
                    .gateway
                    .market_order(symbol, Side::Sell, *quantity)
                    .await?;

                book.record_exit(symbol);

                tracing::info!(
                    symbol = %symbol,
                    exit = %price,
                    quantity = %quantity,
                    reason = reason.label(),
                    fill_price = ?fill.price,
                    order_id = %fill.order_id,
                    "Closed position"
                );

                Ok(Some(fill))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BotError;
    use crate::execution::{ExitReason, Position};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Gateway stub recording submissions, optionally failing them all
    #[derive(Default)]
    struct StubGateway {
        orders: Mutex<Vec<(String, Side, f64)>>,
        fail_with: Option<fn() -> BotError>,
    }

    impl StubGateway {
        fn failing(make_err: fn() -> BotError) -> Self {
            Self {
                orders: Mutex::new(Vec::new()),
                fail_with: Some(make_err),
            }
        }

        fn submissions(&self) -> Vec<(String, Side, f64)> {
            self.orders.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OrderGateway for StubGateway {
        async fn market_order(
            &self,
            symbol: &str,
            side: Side,
            quantity: f64,
        ) -> Result<OrderFill> {
            self.orders
                .lock()
                .unwrap()
                .push((symbol.to_string(), side, quantity));

            if let Some(make_err) = self.fail_with {
                return Err(make_err());
            }

            Ok(OrderFill {
                symbol: symbol.to_string(),
                side,
                quantity,
                price: Some(100.0),
                order_id: "stub-1".to_string(),
            })
        }
    }

    fn open_decision(quantity: f64) -> Decision {
        Decision {
            action: TradeAction::OpenLong {
                quantity,
                stop_loss: 99.0,
                take_profit: 102.0,
            },
            reason: "test entry".to_string(),
        }
    }

    fn close_decision(quantity: f64) -> Decision {
        Decision {
            action: TradeAction::CloseLong {
                quantity,
                reason: ExitReason::SignalExit,
            },
            reason: "test exit".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_buy_opens_position() {
        let gateway = Arc::new(StubGateway::default());
        let executor = TradeExecutor::new(gateway.clone());
        let mut book = PositionBook::new();

        let fill = executor
            .apply(&mut book, "BTCUSDT", 100.0, &open_decision(2.0))
            .await
            .unwrap();

        assert!(fill.is_some());
        assert!(book.is_long("BTCUSDT"));
        assert_eq!(gateway.submissions(), vec![("BTCUSDT".to_string(), Side::Buy, 2.0)]);
    }

    #[tokio::test]
    async fn test_failed_buy_leaves_flat() {
        let gateway = Arc::new(StubGateway::failing(|| {
            BotError::OrderRejected("insufficient balance".into())
        }));
        let executor = TradeExecutor::new(gateway.clone());
        let mut book = PositionBook::new();

        let result = executor
            .apply(&mut book, "BTCUSDT", 100.0, &open_decision(2.0))
            .await;

        assert!(matches!(result, Err(BotError::OrderRejected(_))));
        assert_eq!(*book.position("BTCUSDT"), Position::Flat);
        // The submission was attempted exactly once
        assert_eq!(gateway.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_successful_sell_flattens_position() {
        let gateway = Arc::new(StubGateway::default());
        let executor = TradeExecutor::new(gateway.clone());
        let mut book = PositionBook::new();
        book.record_entry("BTCUSDT", 100.0, 2.0, 99.0, 102.0);

        executor
            .apply(&mut book, "BTCUSDT", 101.0, &close_decision(2.0))
            .await
            .unwrap();

        assert!(!book.is_long("BTCUSDT"));
        assert_eq!(gateway.submissions(), vec![("BTCUSDT".to_string(), Side::Sell, 2.0)]);
    }

    #[tokio::test]
    async fn test_failed_sell_keeps_position_open() {
        let gateway = Arc::new(StubGateway::failing(|| {
            BotError::OrderSubmissionFault("timeout".into())
        }));
        let executor = TradeExecutor::new(gateway.clone());
        let mut book = PositionBook::new();
        book.record_entry("BTCUSDT", 100.0, 2.0, 99.0, 102.0);

        let result = executor
            .apply(&mut book, "BTCUSDT", 98.0, &close_decision(2.0))
            .await;

        assert!(matches!(result, Err(BotError::OrderSubmissionFault(_))));
        assert!(book.is_long("BTCUSDT"));
    }

    #[tokio::test]
    async fn test_hold_submits_nothing() {
        let gateway = Arc::new(StubGateway::default());
        let executor = TradeExecutor::new(gateway.clone());
        let mut book = PositionBook::new();

        let decision = Decision {
            action: TradeAction::Hold,
            reason: "test hold".to_string(),
        };
        let fill = executor
            .apply(&mut book, "BTCUSDT", 100.0, &decision)
            .await
            .unwrap();

        assert!(fill.is_none());
        assert!(gateway.submissions().is_empty());
    }
}
