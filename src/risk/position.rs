//! Position lifecycle

use crate::signal::Action;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// What closed a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    StopLoss,
    TakeProfit,
    Manual,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::StopLoss => "stop_loss",
            CloseReason::TakeProfit => "take_profit",
            CloseReason::Manual => "manual",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open or closed risk exposure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub symbol: String,
    /// BUY or SELL; never WAIT
    pub action: Action,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub quantity: Decimal,
    pub confidence: Decimal,
    pub opened_at: DateTime<Utc>,
    pub status: PositionStatus,
    pub close_reason: Option<CloseReason>,
    pub exit_price: Option<Decimal>,
    pub realized_pnl: Option<Decimal>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Stop or target breached at `price`, if any
    pub fn exit_trigger(&self, price: Decimal) -> Option<CloseReason> {
        match self.action {
            Action::Buy if price <= self.stop_loss => Some(CloseReason::StopLoss),
            Action::Buy if price >= self.take_profit => Some(CloseReason::TakeProfit),
            Action::Sell if price >= self.stop_loss => Some(CloseReason::StopLoss),
            Action::Sell if price <= self.take_profit => Some(CloseReason::TakeProfit),
            _ => None,
        }
    }

    /// P&L if closed at `price`
    pub fn pnl_at(&self, price: Decimal) -> Decimal {
        match self.action {
            Action::Sell => (self.entry_price - price) * self.quantity,
            _ => (price - self.entry_price) * self.quantity,
        }
    }

    /// Transition to closed and return the realized P&L
    pub(crate) fn close(&mut self, price: Decimal, reason: CloseReason, at: DateTime<Utc>) -> Decimal {
        let pnl = self.pnl_at(price);
        self.status = PositionStatus::Closed;
        self.close_reason = Some(reason);
        self.exit_price = Some(price);
        self.realized_pnl = Some(pnl);
        self.closed_at = Some(at);
        pnl
    }
}
