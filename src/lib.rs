//! signal-sentry: crypto trade-proposal pipeline
//!
//! This library provides the core components for:
//! - Technical indicators over rolling price history
//! - Rule-based signals from indicator votes
//! - Confidence-weighted consensus with external model opinions
//! - Pump detection on short-horizon price and volume
//! - Daily risk gating, position tracking and stop/target exits
//! - Binance REST snapshots and miniTicker streaming
//! - Periodic runner and CLI
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod clock;
pub mod config;
pub mod consensus;
pub mod feed;
pub mod indicators;
pub mod market;
pub mod pipeline;
pub mod pump;
pub mod risk;
pub mod session;
pub mod signal;
pub mod telemetry;
