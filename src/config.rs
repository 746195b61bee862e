//! Configuration types for signal-sentry
//!
//! Every section falls back to its defaults, so a config file only needs the
//! keys it wants to override. `Config::load` validates before returning; an
//! invalid file is fatal at startup.

use crate::indicators::RsiSmoothing;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors. All of them are fatal before the first cycle.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Traded symbols, e.g. "BTCUSDT"
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
    #[serde(default)]
    pub pump: PumpConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_symbols() -> Vec<String> {
    [
        "BTCUSDT", "ETHUSDT", "BNBUSDT", "ADAUSDT", "SOLUSDT", "XRPUSDT", "DOGEUSDT",
        "LINKUSDT",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            indicators: IndicatorConfig::default(),
            signal: SignalConfig::default(),
            consensus: ConsensusConfig::default(),
            pump: PumpConfig::default(),
            risk: RiskConfig::default(),
            runtime: RuntimeConfig::default(),
            session: SessionConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Technical indicator periods and thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub rsi_smoothing: RsiSmoothing,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub ema_short: usize,
    pub ema_long: usize,
    /// Candle interval requested from the history provider
    pub history_interval: String,
    /// Number of candles kept per symbol
    pub history_limit: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            rsi_smoothing: RsiSmoothing::Simple,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bb_period: 20,
            bb_std_dev: 2.0,
            ema_short: 20,
            ema_long: 50,
            history_interval: "1h".to_string(),
            history_limit: 100,
        }
    }
}

/// Vote weights of the rule signal generator
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub rsi_weight: Decimal,
    pub macd_weight: Decimal,
    pub bollinger_weight: Decimal,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rsi_weight: dec!(0.30),
            macd_weight: dec!(0.25),
            bollinger_weight: dec!(0.20),
        }
    }
}

/// Multi-source consensus settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Weight of the rule signal in the confidence-weighted vote
    pub rule_weight: Decimal,
    /// Weight of each model opinion in the confidence-weighted vote
    pub model_weight: Decimal,
    /// Added when two or more sources agree on the winning action
    pub agreement_bonus: Decimal,
    /// Subtracted from the mean confidence when sources split evenly
    pub disagreement_penalty: Decimal,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            rule_weight: Decimal::ONE,
            model_weight: Decimal::ONE,
            agreement_bonus: dec!(0.10),
            disagreement_penalty: dec!(0.10),
        }
    }
}

/// Pump detection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    /// Minimum 15m price change (0.05 = 5%)
    pub price_threshold: Decimal,
    /// Minimum current/average volume ratio
    pub volume_threshold: Decimal,
    /// Suppression window per symbol; also the scan cadence
    pub scan_cooldown_secs: u64,
    /// Samples averaged for the ~1h baseline
    pub baseline_window: usize,
    /// Samples back for the ~15m change
    pub short_lookback: usize,
    /// Samples averaged for the volume baseline
    pub volume_window: usize,
    /// Half-window compared for the volume trend
    pub trend_window: usize,
    /// Consecutive sampling intervals the 15m move must hold for
    pub sustained_intervals: usize,
    /// Symbols that already moved more than this in 24h are ignored
    pub max_abs_change_24h: Decimal,
    pub history_interval: String,
    pub history_limit: usize,
    /// Feed fresh pump events into the next analysis cycle as a BUY opinion
    pub feed_aggregator: bool,
    /// Where the last 24h of pump events are kept across restarts
    pub history_path: Option<PathBuf>,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            price_threshold: dec!(0.05),
            volume_threshold: dec!(3.0),
            scan_cooldown_secs: 1800,
            baseline_window: 12,
            short_lookback: 3,
            volume_window: 24,
            trend_window: 6,
            sustained_intervals: 2,
            max_abs_change_24h: dec!(0.5),
            history_interval: "5m".to_string(),
            history_limit: 48,
            feed_aggregator: false,
            history_path: Some(PathBuf::from("data/pump_history.json")),
        }
    }
}

/// Risk guard limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub max_daily_trades: u32,
    /// Daily realized loss limit as a signed fraction of reference capital
    pub max_daily_loss: Decimal,
    pub min_risk_reward_ratio: Decimal,
    pub min_confidence: Decimal,
    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    /// Fraction of reference capital committed per trade
    pub position_size: Decimal,
    /// Hard cap on the per-trade fraction
    pub max_position_pct: Decimal,
    pub reference_capital: Decimal,
    /// How long an emitted directive stays actionable
    pub directive_validity_secs: u64,
    /// Where the daily risk state is persisted between restarts
    pub state_path: Option<PathBuf>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_daily_trades: 2,
            max_daily_loss: dec!(-0.02),
            min_risk_reward_ratio: dec!(1.5),
            min_confidence: dec!(0.5),
            stop_loss_pct: dec!(0.02),
            take_profit_pct: dec!(0.03),
            position_size: dec!(0.1),
            max_position_pct: dec!(0.2),
            reference_capital: dec!(10000),
            directive_validity_secs: 3600,
            state_path: Some(PathBuf::from("data/risk_state.json")),
        }
    }
}

/// Cadences, timeouts and endpoints of the runner
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub analysis_interval_secs: u64,
    pub exit_check_interval_secs: u64,
    /// Upper bound on any single external call
    pub call_timeout_secs: u64,
    /// Drive stop/target checks from the streaming ticker
    pub stream_ticks: bool,
    pub rest_url: String,
    pub ws_url: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            analysis_interval_secs: 3600,
            exit_check_interval_secs: 60,
            call_timeout_secs: 10,
            stream_ticks: true,
            rest_url: crate::market::BINANCE_REST_URL.to_string(),
            ws_url: crate::feed::BINANCE_STREAM_URL.to_string(),
        }
    }
}

/// Trading session handling
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Multiply aggregated confidence by the session risk multiplier
    pub scale_confidence: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scale_confidence: true,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Prometheus exporter port; disabled when unset
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no cycle could run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::invalid("symbols", "at least one symbol required"));
        }

        let ind = &self.indicators;
        for (field, value) in [
            ("indicators.rsi_period", ind.rsi_period),
            ("indicators.macd_fast", ind.macd_fast),
            ("indicators.macd_slow", ind.macd_slow),
            ("indicators.macd_signal", ind.macd_signal),
            ("indicators.bb_period", ind.bb_period),
            ("indicators.ema_short", ind.ema_short),
            ("indicators.ema_long", ind.ema_long),
            ("indicators.history_limit", ind.history_limit),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be positive"));
            }
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(ConfigError::invalid(
                "indicators.macd_fast",
                format!("{} must be below macd_slow {}", ind.macd_fast, ind.macd_slow),
            ));
        }
        if ind.ema_short >= ind.ema_long {
            return Err(ConfigError::invalid(
                "indicators.ema_short",
                format!("{} must be below ema_long {}", ind.ema_short, ind.ema_long),
            ));
        }
        if !(0.0..=100.0).contains(&ind.rsi_oversold)
            || !(0.0..=100.0).contains(&ind.rsi_overbought)
            || ind.rsi_oversold >= ind.rsi_overbought
        {
            return Err(ConfigError::invalid(
                "indicators.rsi_oversold",
                format!(
                    "need 0 <= oversold ({}) < overbought ({}) <= 100",
                    ind.rsi_oversold, ind.rsi_overbought
                ),
            ));
        }
        if ind.bb_std_dev <= 0.0 {
            return Err(ConfigError::invalid("indicators.bb_std_dev", "must be positive"));
        }

        let sig = &self.signal;
        for (field, value) in [
            ("signal.rsi_weight", sig.rsi_weight),
            ("signal.macd_weight", sig.macd_weight),
            ("signal.bollinger_weight", sig.bollinger_weight),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::invalid(field, "must be within [0, 1]"));
            }
        }

        let con = &self.consensus;
        if con.rule_weight < Decimal::ZERO || con.model_weight < Decimal::ZERO {
            return Err(ConfigError::invalid("consensus.rule_weight", "weights must be >= 0"));
        }
        if con.rule_weight.is_zero() && con.model_weight.is_zero() {
            return Err(ConfigError::invalid("consensus.model_weight", "both weights are zero"));
        }
        if con.agreement_bonus < Decimal::ZERO || con.disagreement_penalty < Decimal::ZERO {
            return Err(ConfigError::invalid(
                "consensus.agreement_bonus",
                "bonus and penalty must be >= 0",
            ));
        }

        let pump = &self.pump;
        if pump.price_threshold <= Decimal::ZERO {
            return Err(ConfigError::invalid("pump.price_threshold", "must be positive"));
        }
        if pump.volume_threshold <= Decimal::ZERO {
            return Err(ConfigError::invalid("pump.volume_threshold", "must be positive"));
        }
        if pump.scan_cooldown_secs == 0 {
            return Err(ConfigError::invalid("pump.scan_cooldown_secs", "must be positive"));
        }
        for (field, value) in [
            ("pump.baseline_window", pump.baseline_window),
            ("pump.short_lookback", pump.short_lookback),
            ("pump.volume_window", pump.volume_window),
            ("pump.trend_window", pump.trend_window),
            ("pump.sustained_intervals", pump.sustained_intervals),
            ("pump.history_limit", pump.history_limit),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be positive"));
            }
        }

        let risk = &self.risk;
        if risk.max_daily_trades == 0 {
            return Err(ConfigError::invalid("risk.max_daily_trades", "must be positive"));
        }
        if risk.max_daily_loss >= Decimal::ZERO {
            return Err(ConfigError::invalid(
                "risk.max_daily_loss",
                "must be a negative fraction, e.g. -0.02",
            ));
        }
        if risk.min_confidence < Decimal::ZERO || risk.min_confidence > Decimal::ONE {
            return Err(ConfigError::invalid("risk.min_confidence", "must be within [0, 1]"));
        }
        if risk.min_risk_reward_ratio <= Decimal::ZERO {
            return Err(ConfigError::invalid("risk.min_risk_reward_ratio", "must be positive"));
        }
        for (field, value) in [
            ("risk.stop_loss_pct", risk.stop_loss_pct),
            ("risk.take_profit_pct", risk.take_profit_pct),
            ("risk.position_size", risk.position_size),
            ("risk.max_position_pct", risk.max_position_pct),
        ] {
            if value <= Decimal::ZERO || value >= Decimal::ONE {
                return Err(ConfigError::invalid(field, "must be within (0, 1)"));
            }
        }
        if risk.position_size > risk.max_position_pct {
            return Err(ConfigError::invalid(
                "risk.position_size",
                format!(
                    "{} exceeds max_position_pct {}",
                    risk.position_size, risk.max_position_pct
                ),
            ));
        }
        if risk.reference_capital <= Decimal::ZERO {
            return Err(ConfigError::invalid("risk.reference_capital", "must be positive"));
        }

        let rt = &self.runtime;
        if rt.analysis_interval_secs == 0
            || rt.exit_check_interval_secs == 0
            || rt.call_timeout_secs == 0
        {
            return Err(ConfigError::invalid(
                "runtime",
                "intervals and call timeout must be positive",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.indicators.rsi_period, 14);
        assert_eq!(config.risk.max_daily_trades, 2);
        assert_eq!(config.pump.price_threshold, dec!(0.05));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.symbols.len(), 8);
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
        assert!(config.session.scale_confidence);
    }

    #[test]
    fn test_session_scaling_can_be_disabled() {
        let config = Config::from_toml("[session]\nscale_confidence = false\n").unwrap();
        assert!(!config.session.scale_confidence);
    }

    #[test]
    fn test_partial_override() {
        let toml = r#"
            symbols = ["BTCUSDT"]

            [indicators]
            rsi_period = 10
            rsi_smoothing = "wilder"

            [risk]
            max_daily_trades = 5
            stop_loss_pct = 0.01

            [telemetry]
            log_format = "json"
            metrics_port = 9100
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.symbols, vec!["BTCUSDT".to_string()]);
        assert_eq!(config.indicators.rsi_period, 10);
        assert_eq!(config.indicators.rsi_smoothing, RsiSmoothing::Wilder);
        assert_eq!(config.indicators.macd_slow, 26);
        assert_eq!(config.risk.max_daily_trades, 5);
        assert_eq!(config.risk.stop_loss_pct, dec!(0.01));
        assert_eq!(config.telemetry.metrics_port, Some(9100));
    }

    #[test]
    fn test_zero_period_rejected() {
        let result = Config::from_toml("[indicators]\nrsi_period = 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "indicators.rsi_period",
                ..
            })
        ));
    }

    #[test]
    fn test_inverted_rsi_thresholds_rejected() {
        let result = Config::from_toml("[indicators]\nrsi_oversold = 80.0\nrsi_overbought = 20.0\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "indicators.rsi_oversold",
                ..
            })
        ));
    }

    #[test]
    fn test_inverted_macd_rejected() {
        let result = Config::from_toml("[indicators]\nmacd_fast = 30\nmacd_slow = 12\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "indicators.macd_fast",
                ..
            })
        ));
    }

    #[test]
    fn test_positive_daily_loss_rejected() {
        let result = Config::from_toml("[risk]\nmax_daily_loss = 0.02\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "risk.max_daily_loss",
                ..
            })
        ));
    }

    #[test]
    fn test_position_size_above_cap_rejected() {
        let result = Config::from_toml("[risk]\nposition_size = 0.5\nmax_position_pct = 0.2\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "risk.position_size",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_toml() {
        let result = Config::from_toml("[risk\nmax_daily_trades = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(ConfigError::Read(_))));
    }
}
