//! Risk management module
//!
//! Daily trade and loss budgets, risk/reward gating and the open-position
//! lifecycle. One guard instance serializes all mutations.

mod guard;
mod position;
mod state;
mod store;
mod types;

pub use guard::RiskGuard;
pub use position::{CloseReason, Position, PositionStatus};
pub use state::{DailyRiskState, DailyStats};
pub use store::{JsonFileStore, RiskStateStore};
pub use types::{RiskRejection, TradePlan};
