// Position lifecycle and order execution module
pub mod executor;
pub mod position;
pub mod state_machine;

pub use executor::TradeExecutor;
pub use position::{Position, PositionBook};
pub use state_machine::{decide, Decision, ExitReason, TradeAction};
