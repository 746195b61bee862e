//! End-to-end pipeline tests against in-memory providers

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use signal_sentry::clock::ManualClock;
use signal_sentry::config::Config;
use signal_sentry::consensus::ModelSignalSource;
use signal_sentry::feed::PriceTick;
use signal_sentry::market::{HistoryProvider, MarketDataProvider, MarketSnapshot, PricePoint};
use signal_sentry::pipeline::{CycleOutcome, Pipeline, RejectionStage, PUMP_SOURCE};
use signal_sentry::risk::{CloseReason, DailyRiskState, JsonFileStore, RiskStateStore};
use signal_sentry::signal::{Action, AiSignal};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Monday, inside the liquid hours
fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()
}

#[derive(Default)]
struct FakeMarket {
    snapshots: Mutex<HashMap<String, MarketSnapshot>>,
    /// Keyed by (symbol, interval)
    histories: Mutex<HashMap<(String, String), Vec<PricePoint>>>,
    broken_history: Mutex<HashSet<String>>,
    down: AtomicBool,
}

impl FakeMarket {
    fn set_price(&self, symbol: &str, price: Decimal) {
        self.set_snapshot(symbol, price, dec!(0.01));
    }

    fn set_snapshot(&self, symbol: &str, price: Decimal, change_24h: Decimal) {
        self.snapshots.lock().unwrap().insert(
            symbol.to_string(),
            MarketSnapshot {
                symbol: symbol.to_string(),
                price,
                volume: dec!(1000000),
                high_24h: price,
                low_24h: price,
                change_24h,
                timestamp: start(),
                source: "fake".to_string(),
            },
        );
    }

    fn set_history(&self, symbol: &str, interval: &str, points: Vec<PricePoint>) {
        self.histories
            .lock()
            .unwrap()
            .insert((symbol.to_string(), interval.to_string()), points);
    }

    fn break_history(&self, symbol: &str) {
        self.broken_history.lock().unwrap().insert(symbol.to_string());
    }
}

#[async_trait]
impl MarketDataProvider for FakeMarket {
    async fn fetch(&self, symbols: &[String]) -> anyhow::Result<HashMap<String, MarketSnapshot>> {
        if self.down.load(Ordering::SeqCst) {
            anyhow::bail!("exchange unreachable");
        }
        let snapshots = self.snapshots.lock().unwrap();
        Ok(symbols
            .iter()
            .filter_map(|s| snapshots.get(s).map(|snap| (s.clone(), snap.clone())))
            .collect())
    }
}

#[async_trait]
impl HistoryProvider for FakeMarket {
    async fn fetch_series(
        &self,
        symbol: &str,
        interval: &str,
        _limit: usize,
    ) -> anyhow::Result<Vec<PricePoint>> {
        if self.broken_history.lock().unwrap().contains(symbol) {
            anyhow::bail!("klines request failed");
        }
        Ok(self
            .histories
            .lock()
            .unwrap()
            .get(&(symbol.to_string(), interval.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// Model that always answers the same action for every symbol
struct FixedModel {
    id: String,
    action: Action,
    confidence: Decimal,
    delay: Option<std::time::Duration>,
}

impl FixedModel {
    fn arc(id: &str, action: Action, confidence: Decimal) -> Arc<dyn ModelSignalSource> {
        Arc::new(Self {
            id: id.to_string(),
            action,
            confidence,
            delay: None,
        })
    }

    fn hanging(id: &str) -> Arc<dyn ModelSignalSource> {
        Arc::new(Self {
            id: id.to_string(),
            action: Action::Sell,
            confidence: dec!(1),
            delay: Some(std::time::Duration::from_secs(30)),
        })
    }
}

#[async_trait]
impl ModelSignalSource for FixedModel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn analyze(
        &self,
        symbol: &str,
        _snapshot: &MarketSnapshot,
    ) -> anyhow::Result<Option<AiSignal>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Some(AiSignal::new(symbol, &self.id, self.action, self.confidence, "fixed")))
    }
}

/// Abstaining model whose answer takes `by` of clock time
struct DriftingModel {
    clock: Arc<ManualClock>,
    by: Duration,
}

#[async_trait]
impl ModelSignalSource for DriftingModel {
    fn id(&self) -> &str {
        "model-drift"
    }

    async fn analyze(
        &self,
        _symbol: &str,
        _snapshot: &MarketSnapshot,
    ) -> anyhow::Result<Option<AiSignal>> {
        self.clock.advance(self.by);
        Ok(None)
    }
}

/// Session scaling off so confidences stay exact; the scaling tests opt back in
fn config() -> Config {
    let mut config = Config::default();
    config.risk.state_path = None;
    config.pump.history_path = None;
    config.runtime.call_timeout_secs = 1;
    config.session.scale_confidence = false;
    config
}

fn bullish_models() -> Vec<Arc<dyn ModelSignalSource>> {
    vec![
        FixedModel::arc("model-a", Action::Buy, dec!(0.9)),
        FixedModel::arc("model-b", Action::Buy, dec!(0.8)),
    ]
}

fn symbols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

struct Harness {
    market: Arc<FakeMarket>,
    clock: Arc<ManualClock>,
    pipeline: Pipeline,
}

fn harness(config: Config, sources: Vec<Arc<dyn ModelSignalSource>>) -> Harness {
    let market = Arc::new(FakeMarket::default());
    let clock = Arc::new(ManualClock::new(start()));
    let pipeline = Pipeline::new(config, market.clone(), market.clone())
        .with_clock(clock.clone())
        .with_sources(sources);
    Harness {
        market,
        clock,
        pipeline,
    }
}

#[tokio::test]
async fn test_agreeing_models_produce_directive() {
    let h = harness(config(), bullish_models());
    h.market.set_price("BTCUSDT", dec!(100));

    let outcomes = h.pipeline.run_cycle(&symbols(&["BTCUSDT"])).await;
    assert_eq!(outcomes.len(), 1);

    let directive = outcomes[0].directive().expect("directive");
    assert_eq!(directive.action, Action::Buy);
    assert_eq!(directive.entry_price, dec!(100));
    assert_eq!(directive.stop_loss, dec!(98));
    assert_eq!(directive.take_profit, dec!(103));
    assert_eq!(directive.quantity, dec!(10));
    // mean 0.85 plus agreement bonus 0.10
    assert_eq!(directive.confidence, dec!(0.95));
    assert_eq!(directive.sources, symbols(&["model-a", "model-b", "rule"]));
    assert_eq!(directive.agreeing_sources, 2);
    assert_eq!(
        directive.rationale,
        "model-a BUY 0.9 (fixed); model-b BUY 0.8 (fixed); rule WAIT 0 (no indicator votes)"
    );
    assert_eq!(directive.issued_at, start());
    assert_eq!(directive.valid_until, start() + Duration::hours(1));

    let state = h.pipeline.daily_risk_state().await;
    assert_eq!(state.trades_opened_today, 1);
    assert!(state.open_positions.contains_key("BTCUSDT"));
}

#[tokio::test]
async fn test_rule_wait_is_rejected_by_risk() {
    let h = harness(config(), vec![]);
    h.market.set_price("BTCUSDT", dec!(100));

    let outcomes = h.pipeline.run_cycle(&symbols(&["BTCUSDT"])).await;
    let rejection = outcomes[0].rejection().expect("rejection");
    assert_eq!(rejection.stage, RejectionStage::Risk);
    assert_eq!(rejection.reason, "no-action");
    assert_eq!(rejection.confidence, Some(Decimal::ZERO));
}

#[tokio::test]
async fn test_one_symbol_failure_is_isolated() {
    let h = harness(config(), bullish_models());
    h.market.set_price("BTCUSDT", dec!(100));
    h.market.set_price("ETHUSDT", dec!(2000));
    h.market.break_history("ETHUSDT");

    let outcomes = h
        .pipeline
        .run_cycle(&symbols(&["BTCUSDT", "ETHUSDT", "SOLUSDT"]))
        .await;
    assert_eq!(outcomes.len(), 3);

    assert!(outcomes[0].directive().is_some());

    let eth = outcomes[1].rejection().expect("eth rejected");
    assert_eq!(eth.symbol, "ETHUSDT");
    assert_eq!(eth.stage, RejectionStage::Data);
    assert_eq!(eth.reason, "history-unavailable");

    // no snapshot at all
    let sol = outcomes[2].rejection().expect("sol rejected");
    assert_eq!(sol.reason, "data-unavailable");
}

#[tokio::test]
async fn test_market_outage_rejects_every_symbol() {
    let h = harness(config(), bullish_models());
    h.market.set_price("BTCUSDT", dec!(100));
    h.market.down.store(true, Ordering::SeqCst);

    let outcomes = h.pipeline.run_cycle(&symbols(&["BTCUSDT", "ETHUSDT"])).await;
    assert_eq!(outcomes.len(), 2);
    for outcome in &outcomes {
        let rejection = outcome.rejection().expect("rejected");
        assert_eq!(rejection.reason, "market-unavailable");
    }
    assert_eq!(h.pipeline.daily_risk_state().await.trades_opened_today, 0);
}

#[tokio::test]
async fn test_daily_cap_applies_in_symbol_order() {
    let h = harness(config(), bullish_models());
    for symbol in ["BTCUSDT", "ETHUSDT", "SOLUSDT"] {
        h.market.set_price(symbol, dec!(100));
    }

    let outcomes = h
        .pipeline
        .run_cycle(&symbols(&["BTCUSDT", "ETHUSDT", "SOLUSDT"]))
        .await;
    assert!(outcomes[0].directive().is_some());
    assert!(outcomes[1].directive().is_some());
    let capped = outcomes[2].rejection().expect("capped");
    assert_eq!(capped.reason, "daily-cap");

    // next day the budget is back
    h.clock.advance(Duration::days(1));
    let outcomes = h.pipeline.run_cycle(&symbols(&["SOLUSDT"])).await;
    assert!(outcomes[0].directive().is_some());
}

#[tokio::test]
async fn test_cycle_crossing_midnight_opens_on_new_day() {
    let Harness {
        market,
        clock,
        pipeline,
    } = harness(config(), vec![]);
    let mut sources = bullish_models();
    sources.push(Arc::new(DriftingModel {
        clock: clock.clone(),
        by: Duration::minutes(1),
    }));
    let pipeline = pipeline.with_sources(sources);
    for symbol in ["BTCUSDT", "ETHUSDT", "SOLUSDT"] {
        market.set_price(symbol, dec!(100));
    }

    // fill Monday's budget
    clock.set(Utc.with_ymd_and_hms(2024, 3, 4, 23, 50, 0).unwrap());
    let outcomes = pipeline.run_cycle(&symbols(&["BTCUSDT", "ETHUSDT"])).await;
    assert!(outcomes.iter().all(|o| o.directive().is_some()));

    // analysis starts on Monday and finishes on Tuesday
    clock.set(Utc.with_ymd_and_hms(2024, 3, 4, 23, 59, 30).unwrap());
    let outcomes = pipeline.run_cycle(&symbols(&["SOLUSDT"])).await;
    let tuesday = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 30).unwrap();
    let directive = outcomes[0].directive().expect("opened on the new day");
    assert_eq!(directive.issued_at, tuesday);
    assert_eq!(directive.valid_until, tuesday + Duration::hours(1));

    let state = pipeline.daily_risk_state().await;
    assert_eq!(state.date, tuesday.date_naive());
    assert_eq!(state.trades_opened_today, 1);
}

#[tokio::test]
async fn test_second_signal_conflicts_with_open_position() {
    let h = harness(config(), bullish_models());
    h.market.set_price("BTCUSDT", dec!(100));

    h.pipeline.run_cycle(&symbols(&["BTCUSDT"])).await;
    let outcomes = h.pipeline.run_cycle(&symbols(&["BTCUSDT"])).await;
    assert_eq!(outcomes[0].rejection().unwrap().reason, "position-conflict");
}

#[tokio::test]
async fn test_hanging_model_is_ignored() {
    let mut sources = bullish_models();
    sources.push(FixedModel::hanging("model-slow"));
    let h = harness(config(), sources);
    h.market.set_price("BTCUSDT", dec!(100));

    let outcomes = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        h.pipeline.run_cycle(&symbols(&["BTCUSDT"])),
    )
    .await
    .expect("cycle bounded by call timeout");

    let directive = outcomes[0].directive().expect("directive");
    assert!(!directive.sources.iter().any(|s| s == "model-slow"));
}

#[tokio::test]
async fn test_tick_closes_position_at_stop() {
    let h = harness(config(), bullish_models());
    h.market.set_price("BTCUSDT", dec!(100));
    h.pipeline.run_cycle(&symbols(&["BTCUSDT"])).await;

    let tick = |price: Decimal| PriceTick {
        symbol: "BTCUSDT".to_string(),
        price,
        timestamp: start(),
        exchange_ts: start(),
    };

    assert!(h.pipeline.on_tick(&tick(dec!(99))).await.is_empty());

    let closed = h.pipeline.on_tick(&tick(dec!(97.5))).await;
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].close_reason, Some(CloseReason::StopLoss));
    assert_eq!(closed[0].realized_pnl, Some(dec!(-25)));

    let stats = h.pipeline.daily_stats().await;
    assert_eq!(stats.realized_pnl, dec!(-25));
    assert_eq!(stats.losses, 1);
    assert_eq!(stats.open_positions, 0);

    // unknown symbols are ignored
    let other = PriceTick {
        symbol: "ETHUSDT".to_string(),
        ..tick(dec!(1))
    };
    assert!(h.pipeline.on_tick(&other).await.is_empty());
}

#[tokio::test]
async fn test_periodic_exit_check_uses_snapshots() {
    let h = harness(config(), bullish_models());
    h.market.set_price("BTCUSDT", dec!(100));
    h.pipeline.run_cycle(&symbols(&["BTCUSDT"])).await;

    h.market.set_price("BTCUSDT", dec!(103.5));
    let closed = h.pipeline.check_exits_from_market().await;
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].close_reason, Some(CloseReason::TakeProfit));
    assert_eq!(closed[0].realized_pnl, Some(dec!(35)));
    assert!(h.pipeline.daily_risk_state().await.open_positions.is_empty());
}

#[tokio::test]
async fn test_manual_close() {
    let h = harness(config(), bullish_models());
    h.market.set_price("BTCUSDT", dec!(100));
    h.pipeline.run_cycle(&symbols(&["BTCUSDT"])).await;

    let closed = h.pipeline.close_position("BTCUSDT", dec!(101)).await.unwrap();
    assert_eq!(closed.close_reason, Some(CloseReason::Manual));
    assert_eq!(closed.realized_pnl, Some(dec!(10)));
    assert!(h.pipeline.close_position("BTCUSDT", dec!(101)).await.is_none());
}

#[tokio::test]
async fn test_open_position_survives_day_roll() {
    let h = harness(config(), bullish_models());
    h.market.set_price("BTCUSDT", dec!(100));
    h.pipeline.run_cycle(&symbols(&["BTCUSDT"])).await;

    h.clock.advance(Duration::days(1));
    let state = h.pipeline.daily_risk_state().await;
    assert_eq!(state.date, (start() + Duration::days(1)).date_naive());
    assert_eq!(state.trades_opened_today, 0);
    assert!(state.open_positions.contains_key("BTCUSDT"));
}

/// 5m candles that ramp into a pump: flat at 100, then 102, 104, 106 and an
/// in-progress candle at 108 carrying 4x the usual volume
fn pump_history(symbol: &str) -> Vec<PricePoint> {
    let first = start() - Duration::minutes(5 * 24);
    let mut prices = vec![dec!(100); 21];
    prices.extend([dec!(102), dec!(104), dec!(106), dec!(108)]);
    prices
        .iter()
        .enumerate()
        .map(|(i, price)| {
            let volume = if i == 24 { dec!(40) } else { dec!(10) };
            PricePoint::new(symbol, first + Duration::minutes(5 * i as i64), *price, volume).unwrap()
        })
        .collect()
}

#[tokio::test]
async fn test_pump_scan_detects_and_respects_cooldown() {
    let h = harness(config(), vec![]);
    h.market.set_snapshot("PUMPUSDT", dec!(108), dec!(0.1));
    h.market.set_history("PUMPUSDT", "5m", pump_history("PUMPUSDT"));
    h.market.set_price("BTCUSDT", dec!(100));

    let events = h.pipeline.run_pump_scan(&symbols(&["PUMPUSDT", "BTCUSDT"])).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].symbol, "PUMPUSDT");
    assert_eq!(events[0].pump_score, dec!(0.9));

    h.clock.advance(Duration::minutes(10));
    assert!(h.pipeline.run_pump_scan(&symbols(&["PUMPUSDT"])).await.is_empty());

    h.clock.advance(Duration::minutes(30));
    assert_eq!(h.pipeline.run_pump_scan(&symbols(&["PUMPUSDT"])).await.len(), 1);

    let stats = h.pipeline.pump_statistics().await;
    assert_eq!(stats.total_events, 2);
    assert_eq!(stats.by_symbol["PUMPUSDT"], 2);
}

#[tokio::test]
async fn test_pump_cooldown_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.pump.history_path = Some(dir.path().join("pumps.json"));

    let h = harness(config.clone(), vec![]);
    h.market.set_snapshot("PUMPUSDT", dec!(108), dec!(0.1));
    h.market.set_history("PUMPUSDT", "5m", pump_history("PUMPUSDT"));
    assert_eq!(h.pipeline.run_pump_scan(&symbols(&["PUMPUSDT"])).await.len(), 1);

    h.clock.advance(Duration::minutes(10));
    let restarted = Pipeline::new(config, h.market.clone(), h.market.clone()).with_clock(h.clock.clone());
    assert!(restarted.restore().await.unwrap());
    assert_eq!(restarted.pump_statistics().await.total_events, 1);

    // the same pump is still inside its cooldown after the restart
    assert!(restarted.run_pump_scan(&symbols(&["PUMPUSDT"])).await.is_empty());

    h.clock.advance(Duration::minutes(20));
    assert_eq!(restarted.run_pump_scan(&symbols(&["PUMPUSDT"])).await.len(), 1);
    assert_eq!(restarted.pump_statistics().await.total_events, 2);
}

#[tokio::test]
async fn test_pump_event_feeds_consensus() {
    let mut config = config();
    config.pump.feed_aggregator = true;
    let h = harness(config, vec![]);
    h.market.set_snapshot("PUMPUSDT", dec!(108), dec!(0.1));
    h.market.set_history("PUMPUSDT", "5m", pump_history("PUMPUSDT"));

    h.pipeline.run_pump_scan(&symbols(&["PUMPUSDT"])).await;
    let outcomes = h.pipeline.run_cycle(&symbols(&["PUMPUSDT"])).await;

    let directive = outcomes[0].directive().expect("directive");
    assert_eq!(directive.action, Action::Buy);
    assert_eq!(directive.confidence, dec!(0.9));
    assert!(directive.sources.iter().any(|s| s == PUMP_SOURCE));
}

/// Defaults apart from the in-memory store and short timeout
fn default_config() -> Config {
    let mut config = Config::default();
    config.risk.state_path = None;
    config.pump.history_path = None;
    config.runtime.call_timeout_secs = 1;
    config
}

#[tokio::test]
async fn test_default_config_scales_by_session() {
    let h = harness(default_config(), vec![FixedModel::arc("model-a", Action::Buy, dec!(0.6))]);
    h.market.set_price("BTCUSDT", dec!(100));

    // Monday 10:00 is the European session: 0.6 * 1.2
    let outcomes = h.pipeline.run_cycle(&symbols(&["BTCUSDT"])).await;
    let directive = outcomes[0].directive().expect("directive");
    assert_eq!(directive.confidence, dec!(0.72));
}

#[tokio::test]
async fn test_session_scaling_lowers_weekend_confidence() {
    let h = harness(default_config(), vec![FixedModel::arc("model-a", Action::Buy, dec!(0.8))]);
    h.market.set_price("BTCUSDT", dec!(100));

    // Saturday: multiplier 0.5 drops 0.8 below the 0.5 minimum
    h.clock.set(Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap());
    let outcomes = h.pipeline.run_cycle(&symbols(&["BTCUSDT"])).await;
    let rejection = outcomes[0].rejection().expect("rejected");
    assert_eq!(rejection.reason, "low-confidence");
    assert_eq!(rejection.confidence, Some(dec!(0.4)));
}

/// Store whose first write stalls long enough for a later one to start
#[derive(Default)]
struct StallingStore {
    saved: Mutex<Vec<DailyRiskState>>,
    writes: AtomicUsize,
    first_write_started: tokio::sync::Notify,
}

#[async_trait]
impl RiskStateStore for StallingStore {
    async fn load(&self) -> anyhow::Result<Option<DailyRiskState>> {
        Ok(self.saved.lock().unwrap().last().cloned())
    }

    async fn save(&self, state: &DailyRiskState) -> anyhow::Result<()> {
        let state = state.clone();
        if self.writes.fetch_add(1, Ordering::SeqCst) == 0 {
            self.first_write_started.notify_one();
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        }
        self.saved.lock().unwrap().push(state);
        Ok(())
    }
}

#[tokio::test]
async fn test_overlapping_writes_persist_latest_state() {
    let store = Arc::new(StallingStore::default());
    let h = harness(config(), bullish_models());
    let pipeline = h
        .pipeline
        .with_store(Some(store.clone() as Arc<dyn RiskStateStore>));
    h.market.set_price("BTCUSDT", dec!(100));

    // close while the open is still being written
    let btc = symbols(&["BTCUSDT"]);
    let (outcomes, closed) = tokio::join!(pipeline.run_cycle(&btc), async {
        store.first_write_started.notified().await;
        pipeline.close_position("BTCUSDT", dec!(101)).await
    });
    assert!(outcomes[0].directive().is_some());
    assert!(closed.is_some());

    let saved = store.saved.lock().unwrap().clone();
    assert_eq!(saved.len(), 2);
    let last = &saved[1];
    assert!(last.open_positions.is_empty());
    assert_eq!(last.realized_pnl_today, dec!(10));
    assert_eq!(last, &pipeline.daily_risk_state().await);
}

#[tokio::test]
async fn test_corrupt_risk_state_fails_restore() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("risk.json");
    std::fs::write(&path, "{\"date\": ").unwrap();

    let h = harness(config(), bullish_models());
    let pipeline = h
        .pipeline
        .with_store(Some(Arc::new(JsonFileStore::new(&path)) as Arc<dyn RiskStateStore>));
    assert!(pipeline.restore().await.is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"date\": ");
}

#[tokio::test]
async fn test_risk_state_persists_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn RiskStateStore> = Arc::new(JsonFileStore::new(dir.path().join("risk.json")));

    let h = harness(config(), bullish_models());
    let pipeline = h.pipeline.with_store(Some(store.clone()));
    h.market.set_price("BTCUSDT", dec!(100));
    pipeline.run_cycle(&symbols(&["BTCUSDT"])).await;

    let restarted = Pipeline::new(config(), h.market.clone(), h.market.clone())
        .with_clock(h.clock.clone())
        .with_store(Some(store));
    assert!(restarted.restore().await.unwrap());

    let state = restarted.daily_risk_state().await;
    assert_eq!(state.trades_opened_today, 1);
    assert!(state.open_positions.contains_key("BTCUSDT"));

    h.market.set_price("BTCUSDT", dec!(100));
    let outcomes = restarted
        .with_sources(bullish_models())
        .run_cycle(&symbols(&["BTCUSDT"]))
        .await;
    assert!(matches!(&outcomes[0], CycleOutcome::Rejected(r) if r.reason == "position-conflict"));
}
