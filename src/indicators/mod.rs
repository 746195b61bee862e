//! Technical indicator module
//!
//! RSI, EMA, MACD and Bollinger Bands over a bounded close-price window.
//! Indicators that need more history than is available come back as `None`
//! instead of failing.

mod engine;
mod types;

pub use engine::{bollinger, ema, ema_series, macd, rsi, sma, IndicatorEngine};
pub use types::{BollingerBands, IndicatorSet, MacdValue, RsiSmoothing};
