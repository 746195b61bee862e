//! Run command implementation

use super::{build_pipeline, resolve_symbols};
use crate::config::Config;
use crate::feed::{BinanceTickerFeed, PriceFeed};
use crate::pipeline::{Runner, RunnerEvent};
use clap::Args;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Symbols to trade (defaults to the configured list)
    pub symbols: Vec<String>,

    /// Disable the streaming ticker; exits are checked on the timer only
    #[arg(long)]
    pub no_stream: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let symbols = resolve_symbols(config, &self.symbols);
        let pipeline = Arc::new(build_pipeline(config).await?);

        let (event_tx, mut event_rx) = mpsc::channel::<RunnerEvent>(256);
        let mut runner = Runner::new(pipeline, symbols.clone()).with_events(event_tx);

        if config.runtime.stream_ticks && !self.no_stream {
            let feed = BinanceTickerFeed::new(config.runtime.ws_url.clone(), &symbols);
            match feed.subscribe().await {
                Ok(ticks) => runner = runner.with_ticks(ticks),
                Err(e) => tracing::warn!(error = %e, "Ticker stream unavailable"),
            }
        }

        let printer = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "Failed to encode runner event"),
                }
            }
        });

        runner
            .run(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                }
            })
            .await?;

        printer.await?;
        Ok(())
    }
}
