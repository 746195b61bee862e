//! Pump detection types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Direction of recent volume relative to the window before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeTrend {
    Increasing,
    Stable,
    /// Not enough volume history to compare
    Unknown,
}

/// Caveats attached to a detected pump
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskFlag {
    /// More than 20% in ~15 minutes
    RetracementRisk,
    /// Volume above 10x its baseline
    ManipulationRisk,
    /// Detected outside 06:00-22:00 UTC
    LowLiquidityRisk,
    /// Already moved more than 30% in 24h
    ExtendedMoveRisk,
    /// ~1h change more than twice the ~15m change
    AcceleratingRisk,
}

impl RiskFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFlag::RetracementRisk => "retracement-risk",
            RiskFlag::ManipulationRisk => "manipulation-risk",
            RiskFlag::LowLiquidityRisk => "low-liquidity-risk",
            RiskFlag::ExtendedMoveRisk => "extended-move-risk",
            RiskFlag::AcceleratingRisk => "accelerating-risk",
        }
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pump strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PumpClass {
    /// Every score term held, including a rising volume trend
    Strong,
    Moderate,
}

/// Raw price and volume deltas for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpMetrics {
    pub current_price: Decimal,
    pub current_volume: Decimal,
    /// Change against the price `short_lookback` samples back
    pub price_change_15m: Decimal,
    /// Change against the mean of the baseline window
    pub price_change_1h: Decimal,
    pub volume_ratio: Decimal,
    pub volume_trend: VolumeTrend,
    pub sustained: bool,
}

/// A detected abnormal move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpEvent {
    pub symbol: String,
    pub detected_at: DateTime<Utc>,
    pub price: Decimal,
    pub price_change_15m: Decimal,
    pub price_change_1h: Decimal,
    pub change_24h: Decimal,
    pub volume_ratio: Decimal,
    pub volume_trend: VolumeTrend,
    /// Sum of the binary score terms, within [0, 1]
    pub pump_score: Decimal,
    pub risk_flags: BTreeSet<RiskFlag>,
    pub sustained: bool,
    pub classification: PumpClass,
}

impl PumpEvent {
    pub fn has_flag(&self, flag: RiskFlag) -> bool {
        self.risk_flags.contains(&flag)
    }
}

/// Summary over the retained event history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PumpStatistics {
    pub total_events: usize,
    pub average_score: Decimal,
    pub strong: usize,
    pub moderate: usize,
    pub by_symbol: BTreeMap<String, usize>,
}
