//! Pump detector
//!
//! The newest candle is treated as the in-progress interval: its volume is the
//! current volume and everything before it forms the baselines. The current
//! price comes from the market snapshot.

use super::types::{PumpClass, PumpEvent, PumpMetrics, PumpStatistics, RiskFlag, VolumeTrend};
use crate::config::PumpConfig;
use crate::market::{MarketSnapshot, PriceSeries};
use chrono::{DateTime, Duration, Timelike, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeSet, HashMap, VecDeque};

const PRICE_WEIGHT: Decimal = dec!(0.4);
const VOLUME_WEIGHT: Decimal = dec!(0.3);
const SUSTAINED_WEIGHT: Decimal = dec!(0.2);
const TREND_WEIGHT: Decimal = dec!(0.1);

const TREND_FACTOR: Decimal = dec!(1.2);
const RETRACEMENT_CHANGE: Decimal = dec!(0.20);
const MANIPULATION_RATIO: Decimal = dec!(10);
const EXTENDED_CHANGE_24H: Decimal = dec!(0.30);
const LIQUID_HOURS: std::ops::Range<u32> = 6..22;

/// Events older than this are dropped from the history
const HISTORY_RETENTION_HOURS: i64 = 24;

/// Detects and deduplicates pumps across symbols
#[derive(Debug)]
pub struct PumpDetector {
    config: PumpConfig,
    cooldown: Duration,
    /// Last time each symbol fired
    last_fired: HashMap<String, DateTime<Utc>>,
    /// Fired events, oldest first
    history: VecDeque<PumpEvent>,
}

impl PumpDetector {
    pub fn new(config: PumpConfig) -> Self {
        let cooldown = Duration::seconds(config.scan_cooldown_secs as i64);
        Self {
            config,
            cooldown,
            last_fired: HashMap::new(),
            history: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    /// Compute price and volume deltas
    ///
    /// `None` when there is no baseline to compare against.
    pub fn metrics(&self, snapshot: &MarketSnapshot, series: &PriceSeries) -> Option<PumpMetrics> {
        let current_volume = series.last()?.volume;
        let baseline = series.without_last();
        let prices = baseline.prices();
        let volumes = baseline.volumes();
        let current_price = snapshot.price;

        let c = &self.config;
        let avg_price = mean(tail(&prices, c.baseline_window))?;
        if avg_price <= Decimal::ZERO {
            return None;
        }
        let price_change_1h = (current_price - avg_price) / avg_price;

        let price_change_15m = if prices.len() >= c.short_lookback {
            change(current_price, prices[prices.len() - c.short_lookback]).unwrap_or(price_change_1h)
        } else {
            price_change_1h
        };

        let volume_ratio = match mean(tail(&volumes, c.volume_window)) {
            Some(avg) if avg > Decimal::ZERO => current_volume / avg,
            _ => Decimal::ONE,
        };

        Some(PumpMetrics {
            current_price,
            current_volume,
            price_change_15m,
            price_change_1h,
            volume_ratio,
            volume_trend: self.volume_trend(&volumes),
            sustained: self.sustained(&prices, current_price),
        })
    }

    fn volume_trend(&self, volumes: &[Decimal]) -> VolumeTrend {
        let window = self.config.trend_window;
        if window == 0 || volumes.len() < window * 2 {
            return VolumeTrend::Unknown;
        }
        let recent = &volumes[volumes.len() - window..];
        let previous = &volumes[volumes.len() - window * 2..volumes.len() - window];
        match (mean(recent), mean(previous)) {
            (Some(r), Some(p)) if r > p * TREND_FACTOR => VolumeTrend::Increasing,
            _ => VolumeTrend::Stable,
        }
    }

    /// The short-lookback change holds at each of the last
    /// `sustained_intervals` sampling points, the newest being the current price
    fn sustained(&self, prices: &[Decimal], current: Decimal) -> bool {
        let lookback = self.config.short_lookback;
        let intervals = self.config.sustained_intervals;
        let path: Vec<Decimal> = prices.iter().copied().chain([current]).collect();

        if lookback == 0 || intervals == 0 || path.len() < lookback + intervals {
            return false;
        }

        (0..intervals).all(|k| {
            let j = path.len() - 1 - k;
            change(path[j], path[j - lookback])
                .is_some_and(|delta| delta >= self.config.price_threshold)
        })
    }

    /// Apply the firing criteria to computed metrics, ignoring cooldown
    pub fn evaluate(
        &self,
        symbol: &str,
        metrics: &PumpMetrics,
        change_24h: Decimal,
        now: DateTime<Utc>,
    ) -> Option<PumpEvent> {
        let c = &self.config;
        let price_met = metrics.price_change_15m >= c.price_threshold;
        let volume_met = metrics.volume_ratio >= c.volume_threshold;
        let quality = change_24h.abs() <= c.max_abs_change_24h;

        if !(price_met && volume_met && quality && metrics.sustained) {
            return None;
        }

        let trend_up = metrics.volume_trend == VolumeTrend::Increasing;
        let mut pump_score = Decimal::ZERO;
        for (held, weight) in [
            (price_met, PRICE_WEIGHT),
            (volume_met, VOLUME_WEIGHT),
            (metrics.sustained, SUSTAINED_WEIGHT),
            (trend_up, TREND_WEIGHT),
        ] {
            if held {
                pump_score += weight;
            }
        }
        let pump_score = pump_score.min(Decimal::ONE);

        let classification = if pump_score == Decimal::ONE {
            PumpClass::Strong
        } else {
            PumpClass::Moderate
        };

        Some(PumpEvent {
            symbol: symbol.to_string(),
            detected_at: now,
            price: metrics.current_price,
            price_change_15m: metrics.price_change_15m,
            price_change_1h: metrics.price_change_1h,
            change_24h,
            volume_ratio: metrics.volume_ratio,
            volume_trend: metrics.volume_trend,
            pump_score,
            risk_flags: risk_flags(metrics, change_24h, now),
            sustained: metrics.sustained,
            classification,
        })
    }

    /// Detect a pump for one symbol, honouring the per-symbol cooldown
    pub fn detect(
        &mut self,
        snapshot: &MarketSnapshot,
        series: &PriceSeries,
        now: DateTime<Utc>,
    ) -> Option<PumpEvent> {
        self.prune(now);

        let symbol = snapshot.symbol.as_str();
        let metrics = self.metrics(snapshot, series)?;
        let event = self.evaluate(symbol, &metrics, snapshot.change_24h, now)?;

        if let Some(last) = self.last_fired.get(symbol) {
            if now - *last < self.cooldown {
                tracing::debug!(symbol, last_fired = %last, "Pump suppressed by cooldown");
                return None;
            }
        }

        tracing::info!(
            symbol,
            score = %event.pump_score,
            change_15m = %event.price_change_15m.round_dp(4),
            volume_ratio = %event.volume_ratio.round_dp(2),
            class = ?event.classification,
            flags = ?event.risk_flags,
            "Pump detected"
        );

        self.last_fired.insert(symbol.to_string(), now);
        self.history.push_back(event.clone());
        Some(event)
    }

    /// Most recent event for `symbol` still inside its cooldown window
    pub fn active_event(&self, symbol: &str, now: DateTime<Utc>) -> Option<&PumpEvent> {
        self.history
            .iter()
            .rev()
            .find(|e| e.symbol == symbol)
            .filter(|e| now - e.detected_at < self.cooldown)
    }

    /// Fired events still inside the retention window, oldest first
    pub fn events(&self) -> impl Iterator<Item = &PumpEvent> {
        self.history.iter()
    }

    /// Replace history with previously saved events
    ///
    /// Each symbol's cooldown restarts from its newest event, so a pump that
    /// fired before a restart is not reported again inside its window.
    pub fn restore(&mut self, mut events: Vec<PumpEvent>, now: DateTime<Utc>) {
        events.sort_by_key(|e| e.detected_at);
        self.last_fired.clear();
        for event in &events {
            self.last_fired.insert(event.symbol.clone(), event.detected_at);
        }
        self.history = events.into();
        self.prune(now);
    }

    /// Drop history and cooldown records older than the retention window
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::hours(HISTORY_RETENTION_HOURS);
        while self.history.front().is_some_and(|e| e.detected_at < cutoff) {
            self.history.pop_front();
        }
        let cooldown = self.cooldown;
        self.last_fired.retain(|_, at| now - *at < cooldown.max(Duration::hours(HISTORY_RETENTION_HOURS)));
    }

    pub fn statistics(&self) -> PumpStatistics {
        let mut stats = PumpStatistics {
            total_events: self.history.len(),
            ..Default::default()
        };
        if self.history.is_empty() {
            return stats;
        }

        let mut total_score = Decimal::ZERO;
        for event in &self.history {
            total_score += event.pump_score;
            match event.classification {
                PumpClass::Strong => stats.strong += 1,
                PumpClass::Moderate => stats.moderate += 1,
            }
            *stats.by_symbol.entry(event.symbol.clone()).or_default() += 1;
        }
        stats.average_score = total_score / Decimal::from(self.history.len());
        stats
    }
}

fn risk_flags(metrics: &PumpMetrics, change_24h: Decimal, now: DateTime<Utc>) -> BTreeSet<RiskFlag> {
    let mut flags = BTreeSet::new();
    if metrics.price_change_15m > RETRACEMENT_CHANGE {
        flags.insert(RiskFlag::RetracementRisk);
    }
    if metrics.volume_ratio > MANIPULATION_RATIO {
        flags.insert(RiskFlag::ManipulationRisk);
    }
    if !LIQUID_HOURS.contains(&now.hour()) {
        flags.insert(RiskFlag::LowLiquidityRisk);
    }
    if change_24h.abs() > EXTENDED_CHANGE_24H {
        flags.insert(RiskFlag::ExtendedMoveRisk);
    }
    if metrics.price_change_1h > metrics.price_change_15m * Decimal::TWO {
        flags.insert(RiskFlag::AcceleratingRisk);
    }
    flags
}

fn tail(values: &[Decimal], n: usize) -> &[Decimal] {
    &values[values.len().saturating_sub(n)..]
}

fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<Decimal>() / Decimal::from(values.len()))
}

fn change(current: Decimal, reference: Decimal) -> Option<Decimal> {
    if reference <= Decimal::ZERO {
        return None;
    }
    Some((current - reference) / reference)
}
