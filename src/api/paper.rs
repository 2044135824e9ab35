use async_trait::async_trait;
use uuid::Uuid;

use crate::api::OrderGateway;
use crate::error::Result;
use crate::models::{OrderFill, Side};

/// Order sink that confirms every fill without touching the exchange.
///
/// Lets the controller run end-to-end unfunded; fills carry no price (the
/// book records the decision-time price either way).
#[derive(Debug, Clone, Default)]
pub struct PaperGateway;

impl PaperGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OrderGateway for PaperGateway {
    async fn market_order(&self, symbol: &str, side: Side, quantity: f64) -> Result<OrderFill> {
        let order_id = format!("paper-{}", Uuid::new_v4());

        tracing::info!(
            symbol = %symbol,
            side = side.as_str(),
            quantity = %quantity,
            order_id = %order_id,
            "Paper fill"
        );

        Ok(OrderFill {
            symbol: symbol.to_string(),
            side,
            quantity,
            price: None,
            order_id,
        })
    }
}
