//! Analyze command implementation

use super::{build_pipeline, resolve_symbols};
use crate::config::Config;
use clap::Args;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Symbols to analyze (defaults to the configured list)
    pub symbols: Vec<String>,

    /// Also print rejections
    #[arg(short, long)]
    pub all: bool,
}

impl AnalyzeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let symbols = resolve_symbols(config, &self.symbols);
        let pipeline = build_pipeline(config).await?;

        let outcomes = pipeline.run_cycle(&symbols).await;
        for outcome in &outcomes {
            if self.all || outcome.directive().is_some() {
                println!("{}", serde_json::to_string(outcome)?);
            }
        }
        Ok(())
    }
}
