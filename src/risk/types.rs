//! Risk guard types

use crate::signal::Action;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why the risk guard refused a signal
///
/// Checks run in the order the variants are declared and stop at the first
/// failure.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RiskRejection {
    #[error("daily trade cap reached ({trades}/{limit})")]
    DailyCap { trades: u32, limit: u32 },
    #[error("daily loss limit hit: realized {realized} <= {limit}")]
    LossHalt { realized: Decimal, limit: Decimal },
    #[error("signal proposes no action")]
    NoAction,
    #[error("confidence {confidence} below minimum {minimum}")]
    LowConfidence { confidence: Decimal, minimum: Decimal },
    #[error("position already open for {symbol}")]
    PositionConflict { symbol: String },
    #[error("invalid entry price {0}")]
    InvalidPrice(Decimal),
    #[error("risk/reward {ratio} below minimum {minimum}")]
    RiskReward { ratio: Decimal, minimum: Decimal },
}

impl RiskRejection {
    /// Stable reason code used in rejection records and metrics
    pub fn code(&self) -> &'static str {
        match self {
            RiskRejection::DailyCap { .. } => "daily-cap",
            RiskRejection::LossHalt { .. } => "loss-halt",
            RiskRejection::NoAction => "no-action",
            RiskRejection::LowConfidence { .. } => "low-confidence",
            RiskRejection::PositionConflict { .. } => "position-conflict",
            RiskRejection::InvalidPrice(_) => "invalid-price",
            RiskRejection::RiskReward { .. } => "risk-reward",
        }
    }
}

/// Accepted trade parameters, not yet opened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub symbol: String,
    pub action: Action,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub quantity: Decimal,
    pub confidence: Decimal,
    pub risk_reward: Decimal,
}
