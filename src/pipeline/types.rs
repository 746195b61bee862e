//! Pipeline output types

use crate::market::SeriesError;
use crate::consensus::AggregatedSignal;
use crate::risk::{Position, RiskRejection};
use crate::session::Session;
use crate::signal::Action;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Accepted trade proposal
///
/// The pipeline never executes it; it only tells a downstream consumer what
/// the risk guard opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDirective {
    pub id: Uuid,
    /// Position tracked by the risk guard for this directive
    pub position_id: Uuid,
    pub symbol: String,
    pub action: Action,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub quantity: Decimal,
    pub confidence: Decimal,
    /// Sources that took part in the consensus
    pub sources: Vec<String>,
    /// Sources that voted the chosen action
    pub agreeing_sources: usize,
    /// Why the consensus landed here, one entry per source
    pub rationale: String,
    pub session: Session,
    pub issued_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl TradeDirective {
    pub fn from_position(
        position: &Position,
        signal: &AggregatedSignal,
        session: Session,
        valid_until: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            position_id: position.id,
            symbol: position.symbol.clone(),
            action: position.action,
            entry_price: position.entry_price,
            stop_loss: position.stop_loss,
            take_profit: position.take_profit,
            quantity: position.quantity,
            confidence: position.confidence,
            sources: signal.sources.clone(),
            agreeing_sources: signal.agreeing_sources,
            rationale: signal.rationale.clone(),
            session,
            issued_at: position.opened_at,
            valid_until,
        }
    }
}

/// Where in the pipeline a symbol dropped out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionStage {
    /// Snapshot or history missing
    Data,
    /// Nothing left to aggregate
    Consensus,
    /// Refused by the risk guard
    Risk,
}

impl RejectionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionStage::Data => "data",
            RejectionStage::Consensus => "consensus",
            RejectionStage::Risk => "risk",
        }
    }
}

/// Why a symbol produced no directive this cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionRecord {
    pub symbol: String,
    pub stage: RejectionStage,
    /// Stable reason code, e.g. "daily-cap"
    pub reason: String,
    /// Human-readable detail
    pub detail: String,
    /// Aggregated confidence, when the symbol got that far
    pub confidence: Option<Decimal>,
    pub at: DateTime<Utc>,
}

impl RejectionRecord {
    pub fn from_error(symbol: &str, error: &PipelineError, at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            stage: error.stage(),
            reason: error.code().to_string(),
            detail: error.to_string(),
            confidence: None,
            at,
        }
    }

    pub fn from_risk(
        symbol: &str,
        rejection: &RiskRejection,
        confidence: Decimal,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            stage: RejectionStage::Risk,
            reason: rejection.code().to_string(),
            detail: rejection.to_string(),
            confidence: Some(confidence),
            at,
        }
    }
}

/// Result of one symbol in one analysis cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CycleOutcome {
    Directive(TradeDirective),
    Rejected(RejectionRecord),
}

impl CycleOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            CycleOutcome::Directive(d) => &d.symbol,
            CycleOutcome::Rejected(r) => &r.symbol,
        }
    }

    pub fn directive(&self) -> Option<&TradeDirective> {
        match self {
            CycleOutcome::Directive(d) => Some(d),
            CycleOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&RejectionRecord> {
        match self {
            CycleOutcome::Rejected(r) => Some(r),
            CycleOutcome::Directive(_) => None,
        }
    }
}

/// Per-symbol failures before the risk stage
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no market snapshot for {symbol}")]
    SnapshotMissing { symbol: String },
    #[error("market data unavailable: {reason}")]
    MarketUnavailable { reason: String },
    #[error("history unavailable for {symbol}: {reason}")]
    HistoryUnavailable { symbol: String, reason: String },
    #[error("bad history: {0}")]
    Series(#[from] SeriesError),
    #[error("no signal to aggregate for {symbol}")]
    NoSignal { symbol: String },
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::SnapshotMissing { .. } => "data-unavailable",
            PipelineError::MarketUnavailable { .. } => "market-unavailable",
            PipelineError::HistoryUnavailable { .. } => "history-unavailable",
            PipelineError::Series(_) => "bad-history",
            PipelineError::NoSignal { .. } => "no-signal",
        }
    }

    pub fn stage(&self) -> RejectionStage {
        match self {
            PipelineError::NoSignal { .. } => RejectionStage::Consensus,
            _ => RejectionStage::Data,
        }
    }
}
