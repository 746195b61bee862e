//! Scan command implementation

use super::{build_pipeline, resolve_symbols};
use crate::config::Config;
use clap::Args;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Symbols to scan (defaults to the configured list)
    pub symbols: Vec<String>,
}

impl ScanArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let symbols = resolve_symbols(config, &self.symbols);
        let pipeline = build_pipeline(config).await?;

        let events = pipeline.run_pump_scan(&symbols).await;
        if events.is_empty() {
            tracing::info!(scanned = symbols.len(), "No pumps detected");
        }
        for event in &events {
            println!("{}", serde_json::to_string(event)?);
        }
        Ok(())
    }
}
