//! Signal pipeline
//!
//! Wires the collaborators and core stages together:
//! snapshot + history -> indicators -> rule signal -> consensus -> risk guard.
//! Pump scans run over the same providers on their own cadence.
//!
//! Analysis fans out per symbol and per model source with a timeout on every
//! external call. The risk guard and pump detector each sit behind one async
//! mutex, so overlapping cadences and the tick stream serialize their writes.

mod runner;
mod types;

pub use runner::{Runner, RunnerEvent};
pub use types::{CycleOutcome, PipelineError, RejectionRecord, RejectionStage, TradeDirective};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::consensus::{collect_opinions, AggregatedSignal, ConsensusAggregator, ModelSignalSource};
use crate::feed::PriceTick;
use crate::indicators::IndicatorEngine;
use crate::market::{HistoryProvider, MarketDataProvider, MarketSnapshot, PricePoint, PriceSeries};
use crate::pump::{PumpDetector, PumpEvent, PumpHistoryStore, PumpStatistics};
use crate::risk::{DailyRiskState, DailyStats, JsonFileStore, Position, RiskGuard, RiskStateStore};
use crate::session::{SessionContext, SessionInfo, UtcSessionCalendar};
use crate::signal::{Action, AiSignal, RuleSignalGenerator};
use crate::telemetry::{self, CounterMetric, GaugeMetric, LatencyMetric};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures_util::future::join_all;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Source id of opinions derived from pump events
pub const PUMP_SOURCE: &str = "pump-detector";

/// A symbol that made it through consensus
#[derive(Debug, Clone)]
struct Candidate {
    signal: AggregatedSignal,
    price: Decimal,
    session: SessionInfo,
}

/// Explicit context for every pipeline operation
pub struct Pipeline {
    config: Config,
    market: Arc<dyn MarketDataProvider>,
    history: Arc<dyn HistoryProvider>,
    sources: Vec<Arc<dyn ModelSignalSource>>,
    session: Arc<dyn SessionContext>,
    clock: Arc<dyn Clock>,
    store: Option<Arc<dyn RiskStateStore>>,
    /// Held from state snapshot to finished write, so saves land in order
    persist_lock: Mutex<()>,
    pump_store: Option<Arc<dyn PumpHistoryStore>>,
    engine: IndicatorEngine,
    rules: RuleSignalGenerator,
    aggregator: ConsensusAggregator,
    risk: Mutex<RiskGuard>,
    pump: Mutex<PumpDetector>,
    /// Analysis history per symbol, refreshed every cycle
    series: RwLock<HashMap<String, PriceSeries>>,
}

impl Pipeline {
    /// Build a pipeline with no model sources, the UTC session calendar and
    /// the system clock
    pub fn new(
        config: Config,
        market: Arc<dyn MarketDataProvider>,
        history: Arc<dyn HistoryProvider>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = config
            .risk
            .state_path
            .as_ref()
            .map(|path| Arc::new(JsonFileStore::new(path.clone())) as Arc<dyn RiskStateStore>);
        let pump_store = config
            .pump
            .history_path
            .as_ref()
            .map(|path| Arc::new(JsonFileStore::new(path.clone())) as Arc<dyn PumpHistoryStore>);

        Self {
            engine: IndicatorEngine::new(config.indicators.clone()),
            rules: RuleSignalGenerator::new(&config.indicators, config.signal.clone()),
            aggregator: ConsensusAggregator::new(config.consensus.clone()),
            risk: Mutex::new(RiskGuard::new(config.risk.clone(), clock.now())),
            pump: Mutex::new(PumpDetector::new(config.pump.clone())),
            series: RwLock::new(HashMap::new()),
            sources: Vec::new(),
            session: Arc::new(UtcSessionCalendar),
            clock,
            store,
            persist_lock: Mutex::new(()),
            pump_store,
            market,
            history,
            config,
        }
    }

    pub fn with_sources(mut self, sources: Vec<Arc<dyn ModelSignalSource>>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_session(mut self, session: Arc<dyn SessionContext>) -> Self {
        self.session = session;
        self
    }

    /// Replace the clock; the risk guard restarts on the clock's current day
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.risk = Mutex::new(RiskGuard::new(self.config.risk.clone(), clock.now()));
        self.clock = clock;
        self
    }

    pub fn with_store(mut self, store: Option<Arc<dyn RiskStateStore>>) -> Self {
        self.store = store;
        self
    }

    pub fn with_pump_store(mut self, store: Option<Arc<dyn PumpHistoryStore>>) -> Self {
        self.pump_store = store;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.config.runtime.call_timeout_secs.max(1))
    }

    /// Load persisted risk state and pump history, where stores are configured
    ///
    /// Returns whether anything was found. A store that holds unreadable data
    /// is an error.
    pub async fn restore(&self) -> anyhow::Result<bool> {
        let risk = self.restore_risk().await?;
        let pumps = self.restore_pump_history().await?;
        Ok(risk || pumps)
    }

    async fn restore_risk(&self) -> anyhow::Result<bool> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        let Some(state) = store.load().await? else {
            return Ok(false);
        };

        let now = self.clock.now();
        let mut guard = self.risk.lock().await;
        *guard = RiskGuard::restore(self.config.risk.clone(), state, now);
        tracing::info!(
            date = %guard.state().date,
            trades_today = guard.state().trades_opened_today,
            open_positions = guard.state().open_positions.len(),
            "Risk state restored"
        );
        Ok(true)
    }

    async fn restore_pump_history(&self) -> anyhow::Result<bool> {
        let Some(store) = &self.pump_store else {
            return Ok(false);
        };
        let Some(events) = store.load_history().await? else {
            return Ok(false);
        };

        let mut detector = self.pump.lock().await;
        detector.restore(events, self.clock.now());
        tracing::info!(events = detector.events().count(), "Pump history restored");
        Ok(true)
    }

    /// Run one analysis cycle over `symbols`
    ///
    /// Every symbol yields exactly one outcome. Failures stay local to their
    /// symbol.
    pub async fn run_cycle(&self, symbols: &[String]) -> Vec<CycleOutcome> {
        let started = Instant::now();
        let now = self.clock.now();
        tracing::info!(symbols = symbols.len(), "Analysis cycle starting");

        let snapshots = match self.fetch_snapshots(symbols).await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                let outcomes: Vec<CycleOutcome> = symbols
                    .iter()
                    .map(|s| CycleOutcome::Rejected(RejectionRecord::from_error(s, &e, now)))
                    .collect();
                self.record_outcomes(&outcomes);
                return outcomes;
            }
        };

        let analyses = join_all(
            symbols
                .iter()
                .map(|symbol| self.analyze_symbol(symbol, snapshots.get(symbol), now)),
        )
        .await;

        let validity = ChronoDuration::seconds(self.config.risk.directive_validity_secs as i64);
        let mut outcomes = Vec::with_capacity(symbols.len());
        let mut opened = false;

        for (symbol, analysis) in symbols.iter().zip(analyses) {
            let outcome = match analysis {
                Err(e) => {
                    tracing::warn!(symbol = %symbol, reason = e.code(), error = %e, "Symbol skipped");
                    CycleOutcome::Rejected(RejectionRecord::from_error(symbol, &e, now))
                }
                Ok(candidate) => {
                    // Analysis may have crossed midnight; the guard sees the
                    // time of the decision, not of the cycle start.
                    let (result, decided_at) = {
                        let mut guard = self.risk.lock().await;
                        let decided_at = self.clock.now();
                        (guard.open(&candidate.signal, candidate.price, decided_at), decided_at)
                    };
                    match result {
                        Ok(position) => {
                            opened = true;
                            CycleOutcome::Directive(TradeDirective::from_position(
                                &position,
                                &candidate.signal,
                                candidate.session.session,
                                decided_at + validity,
                            ))
                        }
                        Err(rejection) => {
                            tracing::info!(
                                symbol = %symbol,
                                action = %candidate.signal.action,
                                confidence = %candidate.signal.confidence,
                                reason = rejection.code(),
                                "Signal rejected by risk guard"
                            );
                            CycleOutcome::Rejected(RejectionRecord::from_risk(
                                symbol,
                                &rejection,
                                candidate.signal.confidence,
                                decided_at,
                            ))
                        }
                    }
                }
            };
            outcomes.push(outcome);
        }

        if opened {
            self.persist().await;
        }
        self.record_outcomes(&outcomes);
        self.update_risk_gauges().await;
        telemetry::increment(CounterMetric::Cycles);
        telemetry::record_latency(LatencyMetric::Cycle, started.elapsed());

        tracing::info!(
            directives = outcomes.iter().filter(|o| o.directive().is_some()).count(),
            rejections = outcomes.iter().filter(|o| o.rejection().is_some()).count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis cycle complete"
        );
        outcomes
    }

    async fn fetch_snapshots(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, MarketSnapshot>, PipelineError> {
        match self.bounded(self.market.fetch(symbols)).await {
            Ok(snapshots) => Ok(snapshots),
            Err(reason) => {
                tracing::warn!(%reason, "Market data provider degraded");
                telemetry::increment(CounterMetric::DegradedSources);
                Err(PipelineError::MarketUnavailable { reason })
            }
        }
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<PricePoint>, PipelineError> {
        self.bounded(self.history.fetch_series(symbol, interval, limit))
            .await
            .map_err(|reason| {
                telemetry::increment(CounterMetric::DegradedSources);
                PipelineError::HistoryUnavailable {
                    symbol: symbol.to_string(),
                    reason,
                }
            })
    }

    /// Await an external call under the configured timeout
    async fn bounded<T>(
        &self,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, String> {
        let timeout = self.call_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {}s", timeout.as_secs())),
        }
    }

    async fn analyze_symbol(
        &self,
        symbol: &str,
        snapshot: Option<&MarketSnapshot>,
        now: DateTime<Utc>,
    ) -> Result<Candidate, PipelineError> {
        let snapshot = snapshot.ok_or_else(|| PipelineError::SnapshotMissing {
            symbol: symbol.to_string(),
        })?;

        let ind = &self.config.indicators;
        let points = self
            .fetch_history(symbol, &ind.history_interval, ind.history_limit)
            .await?;
        let series = self.refresh_series(symbol, points).await?;

        let indicators = self.engine.compute(&series);
        let rule = self.rules.generate(symbol, snapshot.price, &indicators);

        let mut opinions =
            collect_opinions(&self.sources, symbol, snapshot, self.call_timeout()).await;
        if self.config.pump.feed_aggregator {
            if let Some(opinion) = self.pump_opinion(symbol, now).await {
                opinions.push(opinion);
            }
        }

        let mut signal = self
            .aggregator
            .aggregate(symbol, Some(&rule), &opinions)
            .ok_or_else(|| PipelineError::NoSignal {
                symbol: symbol.to_string(),
            })?;

        let session = self.session.current(now);
        if self.config.session.scale_confidence {
            signal.confidence = (signal.confidence * session.risk_multiplier)
                .clamp(Decimal::ZERO, Decimal::ONE);
        }

        tracing::debug!(
            symbol,
            samples = indicators.samples,
            rule = %rule.action,
            opinions = opinions.len(),
            action = %signal.action,
            confidence = %signal.confidence,
            session = ?session.session,
            "Symbol analyzed"
        );

        Ok(Candidate {
            signal,
            price: snapshot.price,
            session,
        })
    }

    /// Merge fetched candles into the cached series and return a copy
    async fn refresh_series(
        &self,
        symbol: &str,
        points: Vec<PricePoint>,
    ) -> Result<PriceSeries, PipelineError> {
        let capacity = self.config.indicators.history_limit;
        let mut cache = self.series.write().await;
        match cache.get_mut(symbol) {
            Some(series) => {
                series.merge(points);
                Ok(series.clone())
            }
            None => {
                let series = PriceSeries::from_points(symbol, capacity, points)?;
                cache.insert(symbol.to_string(), series.clone());
                Ok(series)
            }
        }
    }

    async fn pump_opinion(&self, symbol: &str, now: DateTime<Utc>) -> Option<AiSignal> {
        let detector = self.pump.lock().await;
        let event = detector.active_event(symbol, now)?;
        Some(AiSignal::new(
            symbol,
            PUMP_SOURCE,
            Action::Buy,
            event.pump_score,
            format!(
                "pump: {}% in 15m on {}x volume",
                (event.price_change_15m * Decimal::ONE_HUNDRED).round_dp(2),
                event.volume_ratio.round_dp(2)
            ),
        ))
    }

    /// Scan `symbols` for pumps
    pub async fn run_pump_scan(&self, symbols: &[String]) -> Vec<PumpEvent> {
        let started = Instant::now();
        let now = self.clock.now();

        let Ok(snapshots) = self.fetch_snapshots(symbols).await else {
            return Vec::new();
        };

        let pc = &self.config.pump;
        let histories = join_all(symbols.iter().filter(|s| snapshots.contains_key(*s)).map(
            |symbol| async move {
                let series = self
                    .fetch_history(symbol, &pc.history_interval, pc.history_limit)
                    .await
                    .and_then(|points| {
                        PriceSeries::from_points(symbol, pc.history_limit, points)
                            .map_err(PipelineError::from)
                    });
                (symbol, series)
            },
        ))
        .await;

        let mut events = Vec::new();
        let mut detector = self.pump.lock().await;
        for (symbol, series) in histories {
            let series = match series {
                Ok(series) => series,
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "Pump scan skipped symbol");
                    continue;
                }
            };
            let Some(snapshot) = snapshots.get(symbol) else {
                continue;
            };
            if let Some(event) = detector.detect(snapshot, &series, now) {
                telemetry::increment(CounterMetric::PumpEvents);
                events.push(event);
            }
        }
        if !events.is_empty() {
            if let Some(store) = &self.pump_store {
                let history: Vec<PumpEvent> = detector.events().cloned().collect();
                if let Err(e) = store.save_history(&history).await {
                    tracing::warn!(error = %e, "Failed to persist pump history");
                }
            }
        }
        drop(detector);

        telemetry::record_latency(LatencyMetric::PumpScan, started.elapsed());
        tracing::info!(
            scanned = symbols.len(),
            events = events.len(),
            "Pump scan complete"
        );
        events
    }

    /// Close positions whose stop or target is breached at `prices`
    pub async fn check_exits(&self, prices: &HashMap<String, Decimal>) -> Vec<Position> {
        let now = self.clock.now();
        let closed = self.risk.lock().await.check_exits(prices, now);
        if !closed.is_empty() {
            for _ in &closed {
                telemetry::increment(CounterMetric::PositionsClosed);
            }
            self.persist().await;
            self.update_risk_gauges().await;
        }
        closed
    }

    /// Exit check driven by one streamed tick
    pub async fn on_tick(&self, tick: &PriceTick) -> Vec<Position> {
        let tracked = self.risk.lock().await.open_position(&tick.symbol).is_some();
        if !tracked {
            return Vec::new();
        }
        let prices = HashMap::from([(tick.symbol.clone(), tick.price)]);
        self.check_exits(&prices).await
    }

    /// Exit check against fresh snapshots for every open position
    pub async fn check_exits_from_market(&self) -> Vec<Position> {
        let symbols: Vec<String> = {
            let guard = self.risk.lock().await;
            guard.state().open_positions.keys().cloned().collect()
        };
        if symbols.is_empty() {
            return Vec::new();
        }

        match self.fetch_snapshots(&symbols).await {
            Ok(snapshots) => {
                let prices = snapshots
                    .into_iter()
                    .map(|(symbol, snapshot)| (symbol, snapshot.price))
                    .collect();
                self.check_exits(&prices).await
            }
            Err(_) => Vec::new(),
        }
    }

    /// Close a position by hand at `price`
    pub async fn close_position(&self, symbol: &str, price: Decimal) -> Option<Position> {
        let now = self.clock.now();
        let closed = self.risk.lock().await.close_manual(symbol, price, now);
        if closed.is_some() {
            telemetry::increment(CounterMetric::PositionsClosed);
            self.persist().await;
            self.update_risk_gauges().await;
        }
        closed
    }

    /// Snapshot of the current day's risk state
    pub async fn daily_risk_state(&self) -> DailyRiskState {
        let mut guard = self.risk.lock().await;
        guard.roll_day(self.clock.now());
        guard.state().clone()
    }

    pub async fn daily_stats(&self) -> DailyStats {
        let mut guard = self.risk.lock().await;
        guard.roll_day(self.clock.now());
        guard.daily_stats()
    }

    pub async fn pump_statistics(&self) -> PumpStatistics {
        self.pump.lock().await.statistics()
    }

    async fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let _writing = self.persist_lock.lock().await;
        let state = self.risk.lock().await.state().clone();
        if let Err(e) = store.save(&state).await {
            tracing::warn!(error = %e, "Failed to persist risk state");
        }
    }

    fn record_outcomes(&self, outcomes: &[CycleOutcome]) {
        for outcome in outcomes {
            match outcome {
                CycleOutcome::Directive(_) => telemetry::increment(CounterMetric::Directives),
                CycleOutcome::Rejected(r) => telemetry::record_rejection(r.stage.as_str(), &r.reason),
            }
        }
    }

    async fn update_risk_gauges(&self) {
        let guard = self.risk.lock().await;
        let state = guard.state();
        telemetry::set_gauge(GaugeMetric::OpenPositions, state.open_positions.len() as f64);
        telemetry::set_gauge(GaugeMetric::TradesToday, state.trades_opened_today as f64);
        telemetry::set_gauge(
            GaugeMetric::DailyRealizedPnl,
            state.realized_pnl_today.to_f64().unwrap_or_default(),
        );
    }
}
