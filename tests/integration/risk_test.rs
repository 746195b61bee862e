//! Risk guard lifecycle tests across days and restarts

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use signal_sentry::config::RiskConfig;
use signal_sentry::consensus::AggregatedSignal;
use signal_sentry::risk::{CloseReason, JsonFileStore, PositionStatus, RiskGuard, RiskRejection, RiskStateStore};
use signal_sentry::signal::Action;
use std::collections::{BTreeMap, HashMap};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

fn signal(symbol: &str, action: Action, confidence: Decimal) -> AggregatedSignal {
    AggregatedSignal {
        symbol: symbol.to_string(),
        action,
        confidence,
        agreeing_sources: 1,
        sources: vec!["rule".to_string()],
        scores: BTreeMap::from([(action, confidence)]),
        rationale: "rule test".to_string(),
    }
}

fn prices(entries: &[(&str, Decimal)]) -> HashMap<String, Decimal> {
    entries.iter().map(|(s, p)| (s.to_string(), *p)).collect()
}

fn config() -> RiskConfig {
    RiskConfig {
        max_daily_trades: 5,
        // -40 on 10k reference capital
        max_daily_loss: dec!(-0.004),
        state_path: None,
        ..Default::default()
    }
}

#[test]
fn test_losses_halt_trading_until_next_day() {
    let mut guard = RiskGuard::new(config(), at(4, 9));

    guard.open(&signal("BTCUSDT", Action::Buy, dec!(0.8)), dec!(100), at(4, 9)).unwrap();
    guard.open(&signal("ETHUSDT", Action::Sell, dec!(0.8)), dec!(100), at(4, 9)).unwrap();

    // long stopped at 98, short stopped at 102: -20 each
    let closed = guard.check_exits(
        &prices(&[("BTCUSDT", dec!(98)), ("ETHUSDT", dec!(102))]),
        at(4, 11),
    );
    assert_eq!(closed.len(), 2);
    assert!(closed.iter().all(|p| p.close_reason == Some(CloseReason::StopLoss)));
    assert_eq!(guard.state().realized_pnl_today, dec!(-40));

    let err = guard
        .open(&signal("SOLUSDT", Action::Buy, dec!(0.9)), dec!(100), at(4, 12))
        .unwrap_err();
    assert_eq!(
        err,
        RiskRejection::LossHalt {
            realized: dec!(-40),
            limit: dec!(-40),
        }
    );
    assert!(guard.daily_stats().halted);

    // a new UTC day lifts the halt
    let position = guard
        .open(&signal("SOLUSDT", Action::Buy, dec!(0.9)), dec!(100), at(5, 0))
        .unwrap();
    assert_eq!(position.status, PositionStatus::Open);
    assert_eq!(guard.state().trades_opened_today, 1);
    assert_eq!(guard.state().realized_pnl_today, Decimal::ZERO);
    assert_eq!(guard.history().len(), 2);
}

#[test]
fn test_short_take_profit() {
    let mut guard = RiskGuard::new(config(), at(4, 9));
    let position = guard
        .open(&signal("ETHUSDT", Action::Sell, dec!(0.7)), dec!(200), at(4, 9))
        .unwrap();
    assert_eq!(position.stop_loss, dec!(204));
    assert_eq!(position.take_profit, dec!(194));
    assert_eq!(position.quantity, dec!(5));

    assert!(guard.check_exits(&prices(&[("ETHUSDT", dec!(195))]), at(4, 10)).is_empty());
    let closed = guard.check_exits(&prices(&[("ETHUSDT", dec!(193))]), at(4, 11));
    assert_eq!(closed[0].close_reason, Some(CloseReason::TakeProfit));
    assert_eq!(closed[0].realized_pnl, Some(dec!(35)));

    let stats = guard.daily_stats();
    assert_eq!(stats.wins, 1);
    assert_eq!(stats.win_rate, Decimal::ONE);
}

#[tokio::test]
async fn test_state_round_trips_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("nested").join("risk.json"));
    assert!(store.load().await.unwrap().is_none());

    let mut guard = RiskGuard::new(config(), at(4, 9));
    guard.open(&signal("BTCUSDT", Action::Buy, dec!(0.8)), dec!(100), at(4, 9)).unwrap();
    guard.open(&signal("ETHUSDT", Action::Buy, dec!(0.8)), dec!(50), at(4, 9)).unwrap();
    guard.close_manual("ETHUSDT", dec!(51), at(4, 10)).unwrap();
    store.save(guard.state()).await.unwrap();

    // same day: counters and positions come back as saved
    let state = store.load().await.unwrap().unwrap();
    let resumed = RiskGuard::restore(config(), state.clone(), at(4, 15));
    assert_eq!(resumed.state(), &state);
    assert_eq!(resumed.state().trades_opened_today, 2);
    assert_eq!(resumed.state().realized_pnl_today, dec!(20));
    assert!(resumed.open_position("BTCUSDT").is_some());

    // next day: counters reset, the open position is kept
    let rolled = RiskGuard::restore(config(), state, at(5, 1));
    assert_eq!(rolled.state().trades_opened_today, 0);
    assert!(rolled.state().closed_today.is_empty());
    assert!(rolled.open_position("BTCUSDT").is_some());
}
