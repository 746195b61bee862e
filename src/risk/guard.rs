//! Risk guard state machine
//!
//! Per symbol a position moves NONE -> OPEN -> CLOSED. Every operation first
//! rolls the daily budget forward if the UTC date changed.

use super::position::{CloseReason, Position, PositionStatus};
use super::state::{DailyRiskState, DailyStats};
use super::types::{RiskRejection, TradePlan};
use crate::config::RiskConfig;
use crate::consensus::AggregatedSignal;
use crate::signal::Action;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

/// Gates signals against the daily budget and tracks open positions
#[derive(Debug)]
pub struct RiskGuard {
    config: RiskConfig,
    state: DailyRiskState,
    /// Every position closed since startup, oldest first
    history: Vec<Position>,
}

impl RiskGuard {
    pub fn new(config: RiskConfig, now: DateTime<Utc>) -> Self {
        Self {
            config,
            state: DailyRiskState::new(now.date_naive()),
            history: Vec::new(),
        }
    }

    /// Resume from persisted state, rolling it forward if it is stale
    pub fn restore(config: RiskConfig, state: DailyRiskState, now: DateTime<Utc>) -> Self {
        let mut guard = Self {
            config,
            state,
            history: Vec::new(),
        };
        guard.roll_day(now);
        guard
    }

    /// Reset daily counters when `now` falls on a new UTC date
    pub fn roll_day(&mut self, now: DateTime<Utc>) -> bool {
        let previous = self.state.date;
        let rolled = self.state.roll_to(now.date_naive());
        if rolled {
            tracing::info!(
                from = %previous,
                to = %self.state.date,
                open_positions = self.state.open_positions.len(),
                "Daily risk budget reset"
            );
        }
        rolled
    }

    /// Realized P&L at or below which trading halts for the day
    pub fn loss_limit(&self) -> Decimal {
        self.config.max_daily_loss * self.config.reference_capital
    }

    /// Run every check and price the trade, without opening it
    pub fn validate(
        &mut self,
        signal: &AggregatedSignal,
        entry: Decimal,
        now: DateTime<Utc>,
    ) -> Result<TradePlan, RiskRejection> {
        self.roll_day(now);
        let c = &self.config;

        if self.state.trades_opened_today >= c.max_daily_trades {
            return Err(RiskRejection::DailyCap {
                trades: self.state.trades_opened_today,
                limit: c.max_daily_trades,
            });
        }
        let limit = self.loss_limit();
        if self.state.realized_pnl_today <= limit {
            return Err(RiskRejection::LossHalt {
                realized: self.state.realized_pnl_today,
                limit,
            });
        }
        if signal.action == Action::Wait {
            return Err(RiskRejection::NoAction);
        }
        if signal.confidence < c.min_confidence {
            return Err(RiskRejection::LowConfidence {
                confidence: signal.confidence,
                minimum: c.min_confidence,
            });
        }
        if self.state.open_positions.contains_key(&signal.symbol) {
            return Err(RiskRejection::PositionConflict {
                symbol: signal.symbol.clone(),
            });
        }
        if entry <= Decimal::ZERO {
            return Err(RiskRejection::InvalidPrice(entry));
        }

        let (stop_loss, take_profit) = match signal.action {
            Action::Sell => (
                entry * (Decimal::ONE + c.stop_loss_pct),
                entry * (Decimal::ONE - c.take_profit_pct),
            ),
            _ => (
                entry * (Decimal::ONE - c.stop_loss_pct),
                entry * (Decimal::ONE + c.take_profit_pct),
            ),
        };

        let risk = (entry - stop_loss).abs();
        let reward = (take_profit - entry).abs();
        let ratio = if risk.is_zero() {
            Decimal::ZERO
        } else {
            reward / risk
        };
        if ratio < c.min_risk_reward_ratio {
            return Err(RiskRejection::RiskReward {
                ratio,
                minimum: c.min_risk_reward_ratio,
            });
        }

        let fraction = c.position_size.min(c.max_position_pct);
        Ok(TradePlan {
            symbol: signal.symbol.clone(),
            action: signal.action,
            entry_price: entry,
            stop_loss,
            take_profit,
            quantity: c.reference_capital * fraction / entry,
            confidence: signal.confidence,
            risk_reward: ratio,
        })
    }

    /// Validate and, on acceptance, open the position
    pub fn open(
        &mut self,
        signal: &AggregatedSignal,
        entry: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Position, RiskRejection> {
        let plan = self.validate(signal, entry, now)?;

        let position = Position {
            id: Uuid::new_v4(),
            symbol: plan.symbol,
            action: plan.action,
            entry_price: plan.entry_price,
            stop_loss: plan.stop_loss,
            take_profit: plan.take_profit,
            quantity: plan.quantity,
            confidence: plan.confidence,
            opened_at: now,
            status: PositionStatus::Open,
            close_reason: None,
            exit_price: None,
            realized_pnl: None,
            closed_at: None,
        };

        self.state.trades_opened_today += 1;
        self.state
            .open_positions
            .insert(position.symbol.clone(), position.clone());

        tracing::info!(
            symbol = %position.symbol,
            action = %position.action,
            entry = %position.entry_price,
            stop_loss = %position.stop_loss,
            take_profit = %position.take_profit,
            quantity = %position.quantity.round_dp(8),
            trades_today = self.state.trades_opened_today,
            "Position opened"
        );
        Ok(position)
    }

    /// Close every open position whose stop or target is breached
    ///
    /// Symbols without a price are left untouched. Returns the positions
    /// closed by this call.
    pub fn check_exits(
        &mut self,
        prices: &HashMap<String, Decimal>,
        now: DateTime<Utc>,
    ) -> Vec<Position> {
        self.roll_day(now);

        let triggered: Vec<(String, Decimal, CloseReason)> = self
            .state
            .open_positions
            .iter()
            .filter_map(|(symbol, position)| {
                let price = *prices.get(symbol)?;
                let reason = position.exit_trigger(price)?;
                Some((symbol.clone(), price, reason))
            })
            .collect();

        triggered
            .into_iter()
            .filter_map(|(symbol, price, reason)| self.close(&symbol, price, reason, now))
            .collect()
    }

    /// Close the open position for `symbol` at `price` regardless of triggers
    pub fn close_manual(
        &mut self,
        symbol: &str,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Option<Position> {
        self.roll_day(now);
        self.close(symbol, price, CloseReason::Manual, now)
    }

    fn close(
        &mut self,
        symbol: &str,
        price: Decimal,
        reason: CloseReason,
        now: DateTime<Utc>,
    ) -> Option<Position> {
        let mut position = self.state.open_positions.remove(symbol)?;
        let pnl = position.close(price, reason, now);
        self.state.realized_pnl_today += pnl;

        tracing::info!(
            symbol,
            %reason,
            exit = %price,
            pnl = %pnl.round_dp(2),
            realized_today = %self.state.realized_pnl_today.round_dp(2),
            "Position closed"
        );
        if self.state.realized_pnl_today <= self.loss_limit() {
            tracing::warn!(
                realized_today = %self.state.realized_pnl_today,
                limit = %self.loss_limit(),
                "Daily loss limit reached, halting new trades"
            );
        }

        self.state.closed_today.push(position.clone());
        self.history.push(position.clone());
        Some(position)
    }

    pub fn state(&self) -> &DailyRiskState {
        &self.state
    }

    pub fn open_position(&self, symbol: &str) -> Option<&Position> {
        self.state.open_positions.get(symbol)
    }

    pub fn history(&self) -> &[Position] {
        &self.history
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn daily_stats(&self) -> DailyStats {
        let closed = &self.state.closed_today;
        let pnl = |p: &&Position| p.realized_pnl.unwrap_or_default();
        let wins = closed.iter().filter(|p| pnl(p) > Decimal::ZERO).count();
        let losses = closed.iter().filter(|p| pnl(p) < Decimal::ZERO).count();
        let win_rate = if closed.is_empty() {
            Decimal::ZERO
        } else {
            Decimal::from(wins) / Decimal::from(closed.len())
        };
        let loss_limit = self.loss_limit();

        DailyStats {
            date: self.state.date,
            trades_opened: self.state.trades_opened_today,
            remaining_trades: self
                .config
                .max_daily_trades
                .saturating_sub(self.state.trades_opened_today),
            closed: closed.len(),
            wins,
            losses,
            win_rate,
            realized_pnl: self.state.realized_pnl_today,
            loss_limit,
            halted: self.state.realized_pnl_today <= loss_limit,
            open_positions: self.state.open_positions.len(),
        }
    }
}
