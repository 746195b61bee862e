//! Configuration loading tests

use rust_decimal_macros::dec;
use signal_sentry::config::{Config, ConfigError, LogFormat};
use signal_sentry::indicators::RsiSmoothing;
use std::io::Write;

#[test]
fn test_example_config_loads() {
    let config = Config::from_toml(include_str!("../../config.toml.example")).unwrap();
    assert_eq!(config.symbols.len(), 8);
    assert_eq!(config.indicators.rsi_smoothing, RsiSmoothing::Simple);
    assert_eq!(config.risk.min_risk_reward_ratio, dec!(1.5));
    assert_eq!(config.pump.history_interval, "5m");
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    assert_eq!(config.telemetry.metrics_port, None);
    assert!(config.session.scale_confidence);
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        symbols = ["BTCUSDT", "ETHUSDT"]

        [risk]
        max_daily_trades = 5
        state_path = "/tmp/sentry-state.json"

        [telemetry]
        log_format = "json"
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.symbols, vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]);
    assert_eq!(config.risk.max_daily_trades, 5);
    // untouched keys keep their defaults
    assert_eq!(config.risk.stop_loss_pct, dec!(0.02));
    assert_eq!(config.telemetry.log_format, LogFormat::Json);
}

#[test]
fn test_missing_file_is_read_error() {
    let err = Config::load("/nonexistent/signal-sentry.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Read(_)));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let err = Config::from_toml("symbols = [").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_invalid_values_are_rejected() {
    let cases = [
        ("symbols = []", "symbols"),
        ("[indicators]\nmacd_fast = 30", "indicators.macd_fast"),
        ("[indicators]\nrsi_oversold = 80.0", "indicators.rsi_oversold"),
        ("[risk]\nmax_daily_loss = 0.02", "risk.max_daily_loss"),
        ("[risk]\nstop_loss_pct = 0", "risk.stop_loss_pct"),
        ("[risk]\nposition_size = 0.5", "risk.position_size"),
        ("[pump]\nprice_threshold = 0", "pump.price_threshold"),
        ("[runtime]\ncall_timeout_secs = 0", "runtime"),
    ];

    for (toml, expected) in cases {
        match Config::from_toml(toml) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected, "{toml}"),
            other => panic!("expected invalid `{expected}` for {toml:?}, got {other:?}"),
        }
    }
}
