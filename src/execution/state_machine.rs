use crate::execution::Position;
use crate::models::Signal;
use crate::risk::{position_size, RiskParameters};

/// Why an open position is being closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    /// The model flipped bearish
    SignalExit,
}

impl ExitReason {
    pub fn label(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop-loss",
            ExitReason::TakeProfit => "take-profit",
            ExitReason::SignalExit => "signal exit",
        }
    }
}

/// The single action chosen for a symbol this cycle
#[derive(Debug, Clone, PartialEq)]
pub enum TradeAction {
    Hold,
    OpenLong {
        quantity: f64,
        stop_loss: f64,
        take_profit: f64,
    },
    CloseLong {
        /// The position's actual held quantity
        quantity: f64,
        reason: ExitReason,
    },
}

#[derive(Debug, Clone)]
pub struct Decision {
    pub action: TradeAction,
    pub reason: String,
}

impl Decision {
    fn hold(reason: impl Into<String>) -> Self {
        Self {
            action: TradeAction::Hold,
            reason: reason.into(),
        }
    }
}

/// The decision core: combine position state, model signal and current
/// price into exactly one action.
///
/// Exit checks run in priority order: stop-loss, then take-profit, then
/// the model's exit signal. The price-based risk controls always override
/// the model; an entry signal has no effect while a position is open.
///
/// This function is pure; executing the action (and mutating state only on
/// a confirmed fill) is the executor's job.
pub fn decide(
    position: &Position,
    signal: Signal,
    price: f64,
    balance: f64,
    risk: &RiskParameters,
) -> Decision {
    match position {
        Position::Flat => match signal {
            Signal::Enter => {
                let stop_loss = risk.stop_price(price);
                let take_profit = risk.target_price(price);
                let quantity = position_size(balance, risk.risk_per_trade, price, stop_loss);

                if quantity <= 0.0 {
                    return Decision::hold(format!(
                        "entry signal, but quantity sized to zero (balance {balance:.2})"
                    ));
                }

                Decision {
                    action: TradeAction::OpenLong {
                        quantity,
                        stop_loss,
                        take_profit,
                    },
                    reason: format!(
                        "entry signal at {price:.4}, stop {stop_loss:.4}, target {take_profit:.4}"
                    ),
                }
            }
            Signal::Exit => Decision::hold("flat, no entry signal"),
        },

        Position::Long {
            quantity,
            stop_loss,
            take_profit,
            ..
        } => {
            if price <= *stop_loss {
                return Decision {
                    action: TradeAction::CloseLong {
                        quantity: *quantity,
                        reason: ExitReason::StopLoss,
                    },
                    reason: format!("price {price:.4} at or below stop {stop_loss:.4}"),
                };
            }

            if price >= *take_profit {
                return Decision {
                    action: TradeAction::CloseLong {
                        quantity: *quantity,
                        reason: ExitReason::TakeProfit,
                    },
                    reason: format!("price {price:.4} at or above target {take_profit:.4}"),
                };
            }

            if signal == Signal::Exit {
                return Decision {
                    action: TradeAction::CloseLong {
                        quantity: *quantity,
                        reason: ExitReason::SignalExit,
                    },
                    reason: format!("exit signal at {price:.4}"),
                };
            }

            Decision::hold("holding, price between stop and target")
        }
    }
}
