//! Indicator output types

use serde::{Deserialize, Serialize};

/// Averaging used for RSI gains and losses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiSmoothing {
    /// Plain mean of the last `period` gains and losses
    #[default]
    Simple,
    /// Wilder's running average seeded with the first `period` deltas
    Wilder,
}

/// MACD line, signal line and histogram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Bollinger band levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub mid: f64,
    pub lower: f64,
}

/// Derived technicals for one symbol at one instant
///
/// `None` marks an indicator that had too little history to compute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub rsi: Option<f64>,
    pub ema_short: Option<f64>,
    pub ema_long: Option<f64>,
    pub macd: Option<MacdValue>,
    pub bollinger: Option<BollingerBands>,
    /// Number of samples the set was computed from
    pub samples: usize,
}

impl IndicatorSet {
    /// Number of indicators that could be computed
    pub fn defined_count(&self) -> usize {
        [
            self.rsi.is_some(),
            self.ema_short.is_some(),
            self.ema_long.is_some(),
            self.macd.is_some(),
            self.bollinger.is_some(),
        ]
        .iter()
        .filter(|d| **d)
        .count()
    }
}
