//! Prometheus metrics
//!
//! Thin wrappers over the `metrics` facade so metric names live in one place.
//! Without an installed recorder every call is a no-op.

use std::time::Duration;

/// Monotonic counters
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Completed analysis cycles
    Cycles,
    /// Directives accepted by the risk guard
    Directives,
    /// Pump events fired
    PumpEvents,
    /// Model or data calls that failed or timed out
    DegradedSources,
    /// Positions closed by stop, target or manual close
    PositionsClosed,
}

/// Latency histograms
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Full analysis cycle
    Cycle,
    /// Pump scan over all symbols
    PumpScan,
    /// Single model source call
    ModelCall,
}

/// Point-in-time gauges
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Open position count
    OpenPositions,
    /// Realized P&L for the current UTC day
    DailyRealizedPnl,
    /// Trades opened in the current UTC day
    TradesToday,
}

fn counter_name(metric: CounterMetric) -> &'static str {
    match metric {
        CounterMetric::Cycles => "sentry_cycles_total",
        CounterMetric::Directives => "sentry_directives_total",
        CounterMetric::PumpEvents => "sentry_pump_events_total",
        CounterMetric::DegradedSources => "sentry_degraded_sources_total",
        CounterMetric::PositionsClosed => "sentry_positions_closed_total",
    }
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric) {
    metrics::counter!(counter_name(metric)).increment(1);
}

/// Count a rejected or skipped symbol by stage and reason code
pub fn record_rejection(stage: &'static str, reason: &str) {
    metrics::counter!(
        "sentry_rejections_total",
        "stage" => stage,
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::Cycle => "sentry_cycle_latency_ms",
        LatencyMetric::PumpScan => "sentry_pump_scan_latency_ms",
        LatencyMetric::ModelCall => "sentry_model_call_latency_ms",
    };
    metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::OpenPositions => "sentry_open_positions",
        GaugeMetric::DailyRealizedPnl => "sentry_daily_realized_pnl",
        GaugeMetric::TradesToday => "sentry_trades_today",
    };
    metrics::gauge!(metric_name).set(value);
}
