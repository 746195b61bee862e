//! Indicator computation
//!
//! Plain functions over `f64` close prices plus an `IndicatorEngine` that
//! applies the configured periods to a `PriceSeries`.

use super::types::{BollingerBands, IndicatorSet, MacdValue, RsiSmoothing};
use crate::config::IndicatorConfig;
use crate::market::PriceSeries;

/// Relative Strength Index over `period` deltas
///
/// Needs at least `period + 1` samples. A window without losses is 100.
pub fn rsi(values: &[f64], period: usize, smoothing: RsiSmoothing) -> Option<f64> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }

    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let gains: Vec<f64> = deltas.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = deltas.iter().map(|d| (-d).max(0.0)).collect();
    let p = period as f64;

    let (avg_gain, avg_loss) = match smoothing {
        RsiSmoothing::Simple => {
            let start = deltas.len() - period;
            (
                gains[start..].iter().sum::<f64>() / p,
                losses[start..].iter().sum::<f64>() / p,
            )
        }
        RsiSmoothing::Wilder => {
            let mut avg_gain = gains[..period].iter().sum::<f64>() / p;
            let mut avg_loss = losses[..period].iter().sum::<f64>() / p;
            for i in period..deltas.len() {
                avg_gain = (avg_gain * (p - 1.0) + gains[i]) / p;
                avg_loss = (avg_loss * (p - 1.0) + losses[i]) / p;
            }
            (avg_gain, avg_loss)
        }
    };

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
}

/// Simple moving average of the last `period` samples
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Full EMA series, seeded with the SMA of the first `period` samples
///
/// Element `i` of the result corresponds to `values[i + period - 1]`.
/// Empty when there are fewer than `period` samples.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let mut series = Vec::with_capacity(values.len() - period + 1);
    series.push(seed);
    let mut current = seed;
    for value in &values[period..] {
        current = alpha * value + (1.0 - alpha) * current;
        series.push(current);
    }
    series
}

/// Latest EMA value
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    ema_series(values, period).last().copied()
}

/// MACD line, signal and histogram
///
/// The signal line is the EMA of the MACD series, which only exists from the
/// first sample where the slow EMA is defined; `slow + signal - 1` samples
/// are required.
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdValue> {
    if fast == 0 || slow == 0 || signal == 0 || values.len() + 1 < slow + signal {
        return None;
    }

    let fast_series = ema_series(values, fast);
    let slow_series = ema_series(values, slow);
    if fast_series.is_empty() || slow_series.is_empty() {
        return None;
    }

    let macd_series: Vec<f64> = (slow - 1..values.len())
        .filter_map(|i| {
            let f = fast_series.get((i + 1).checked_sub(fast)?)?;
            let s = slow_series.get(i + 1 - slow)?;
            Some(f - s)
        })
        .collect();

    let line = *macd_series.last()?;
    let signal_line = ema(&macd_series, signal)?;

    Some(MacdValue {
        line,
        signal: signal_line,
        histogram: line - signal_line,
    })
}

/// Bollinger bands using the population standard deviation
pub fn bollinger(values: &[f64], period: usize, std_dev: f64) -> Option<BollingerBands> {
    let mid = sma(values, period)?;
    let window = &values[values.len() - period..];
    let variance = window.iter().map(|v| (v - mid).powi(2)).sum::<f64>() / period as f64;
    let sigma = variance.sqrt();

    Some(BollingerBands {
        upper: mid + sigma * std_dev,
        mid,
        lower: mid - sigma * std_dev,
    })
}

/// Applies the configured indicator periods to price history
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    /// Compute all indicators over a series' close prices
    pub fn compute(&self, series: &PriceSeries) -> IndicatorSet {
        self.compute_closes(&series.closes())
    }

    /// Compute all indicators over raw close prices, oldest first
    pub fn compute_closes(&self, closes: &[f64]) -> IndicatorSet {
        let c = &self.config;
        IndicatorSet {
            rsi: rsi(closes, c.rsi_period, c.rsi_smoothing),
            ema_short: ema(closes, c.ema_short),
            ema_long: ema(closes, c.ema_long),
            macd: macd(closes, c.macd_fast, c.macd_slow, c.macd_signal),
            bollinger: bollinger(closes, c.bb_period, c.bb_std_dev),
            samples: closes.len(),
        }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }
}
