//! CLI interface for signal-sentry
//!
//! Provides subcommands for:
//! - `run`: Periodic analysis, pump scans and exit checks
//! - `analyze`: One analysis cycle, directives printed as JSON
//! - `scan`: One pump scan
//! - `status`: Today's risk state and pump statistics
//! - `config`: Effective configuration

mod analyze;
mod run;
mod scan;
pub mod status;

pub use analyze::AnalyzeArgs;
pub use run::RunArgs;
pub use scan::ScanArgs;

use crate::config::Config;
use crate::market::{BinanceClient, BinanceConfig};
use crate::pipeline::Pipeline;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "signal-sentry")]
#[command(about = "Indicator scoring, consensus, pump detection and risk gating for crypto trade proposals")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the periodic pipeline until Ctrl-C
    Run(RunArgs),
    /// Run one analysis cycle and print the outcomes
    Analyze(AnalyzeArgs),
    /// Run one pump scan and print the events
    Scan(ScanArgs),
    /// Show today's risk state and the recent pump history
    Status,
    /// Show the effective configuration
    Config,
}

/// Symbols from the command line, or every configured symbol
pub(crate) fn resolve_symbols(config: &Config, requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        config.symbols.clone()
    } else {
        requested.iter().map(|s| s.to_uppercase()).collect()
    }
}

/// Pipeline backed by the Binance REST client, with persisted risk state loaded
///
/// A state file that exists but cannot be read is an error; starting from an
/// empty day would forget the trades and losses already counted.
pub async fn build_pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    let client = Arc::new(BinanceClient::with_config(BinanceConfig {
        base_url: config.runtime.rest_url.clone(),
        timeout: Duration::from_secs(config.runtime.call_timeout_secs.max(1)),
    })?);

    let pipeline = Pipeline::new(config.clone(), client.clone(), client);
    pipeline
        .restore()
        .await
        .context("failed to restore risk state, fix or remove the state file")?;
    Ok(pipeline)
}
