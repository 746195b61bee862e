//! Consensus types

use crate::signal::Action;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fused decision candidate for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSignal {
    pub symbol: String,
    pub action: Action,
    pub confidence: Decimal,
    /// Sources that voted the chosen action
    pub agreeing_sources: usize,
    /// Every participating source id, sorted
    pub sources: Vec<String>,
    /// Confidence-weighted score per action
    pub scores: BTreeMap<Action, Decimal>,
    /// Every ballot with its reasoning, in canonical order
    pub rationale: String,
}

impl AggregatedSignal {
    /// Whether the signal proposes a trade at all
    pub fn is_actionable(&self) -> bool {
        self.action != Action::Wait
    }
}
