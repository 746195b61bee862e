//! Signal types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source id under which the rule signal takes part in consensus
pub const RULE_SOURCE: &str = "rule";

/// Directional action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Wait,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Wait => "WAIT",
        };
        f.write_str(s)
    }
}

/// Indicator that can cast a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Rsi,
    Macd,
    Bollinger,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Indicator::Rsi => "rsi",
            Indicator::Macd => "macd",
            Indicator::Bollinger => "bollinger",
        };
        f.write_str(s)
    }
}

/// One indicator's vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorVote {
    pub indicator: Indicator,
    pub action: Action,
    pub weight: Decimal,
    /// Indicator reading that triggered the vote
    pub value: f64,
}

/// Rule-derived opinion for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSignal {
    pub symbol: String,
    pub action: Action,
    /// Summed weight of the winning side, within [0, 1]
    pub confidence: Decimal,
    /// Every vote cast, both sides
    pub votes: Vec<IndicatorVote>,
    /// Price the indicators were evaluated against
    pub price: Decimal,
}

impl RuleSignal {
    /// Votes as text, e.g. "rsi 24.10 BUY, macd 0.35 BUY"
    pub fn rationale(&self) -> String {
        if self.votes.is_empty() {
            return "no indicator votes".to_string();
        }
        self.votes
            .iter()
            .map(|v| format!("{} {:.2} {}", v.indicator, v.value, v.action))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Externally supplied model opinion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSignal {
    pub symbol: String,
    /// Identifier of the producing source
    pub source: String,
    pub action: Action,
    pub confidence: Decimal,
    pub rationale: String,
}

impl AiSignal {
    /// Create an opinion, clamping confidence into [0, 1]
    pub fn new(
        symbol: impl Into<String>,
        source: impl Into<String>,
        action: Action,
        confidence: Decimal,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            source: source.into(),
            action,
            confidence: confidence.clamp(Decimal::ZERO, Decimal::ONE),
            rationale: rationale.into(),
        }
    }
}
