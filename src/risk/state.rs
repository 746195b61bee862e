//! Per-UTC-day risk budget

use super::position::Position;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Daily counters plus the open-position set
///
/// Counters and `closed_today` reset when the UTC date changes; open
/// positions carry over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRiskState {
    pub date: NaiveDate,
    pub trades_opened_today: u32,
    pub realized_pnl_today: Decimal,
    /// At most one open position per symbol
    pub open_positions: BTreeMap<String, Position>,
    #[serde(default)]
    pub closed_today: Vec<Position>,
}

impl DailyRiskState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            trades_opened_today: 0,
            realized_pnl_today: Decimal::ZERO,
            open_positions: BTreeMap::new(),
            closed_today: Vec::new(),
        }
    }

    /// Move forward to `today`, clearing the daily counters
    ///
    /// Returns `false` when the state is already on `today` or later; the
    /// date never moves backwards.
    pub fn roll_to(&mut self, today: NaiveDate) -> bool {
        if today <= self.date {
            return false;
        }
        self.date = today;
        self.trades_opened_today = 0;
        self.realized_pnl_today = Decimal::ZERO;
        self.closed_today.clear();
        true
    }
}

/// Reporting summary of the current day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub trades_opened: u32,
    pub remaining_trades: u32,
    pub closed: usize,
    pub wins: usize,
    pub losses: usize,
    /// Wins over closed positions; zero when nothing closed
    pub win_rate: Decimal,
    pub realized_pnl: Decimal,
    /// Realized P&L at or below which new trades halt
    pub loss_limit: Decimal,
    pub halted: bool,
    pub open_positions: usize,
}
