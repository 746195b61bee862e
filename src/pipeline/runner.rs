//! Periodic runner
//!
//! Drives the analysis, pump-scan and exit-check cadences plus the optional
//! tick stream until shutdown. Each cadence runs its work on a spawned task;
//! a tick that arrives while the previous run of the same cadence is still
//! busy is skipped.

use super::{CycleOutcome, Pipeline};
use crate::feed::PriceTick;
use crate::pump::PumpEvent;
use crate::risk::Position;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Everything the runner produces, in emission order
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunnerEvent {
    Outcome(CycleOutcome),
    Pump(PumpEvent),
    Closed(Position),
}

pub struct Runner {
    pipeline: Arc<Pipeline>,
    symbols: Arc<Vec<String>>,
    events: Option<mpsc::Sender<RunnerEvent>>,
    ticks: Option<mpsc::Receiver<PriceTick>>,
}

impl Runner {
    pub fn new(pipeline: Arc<Pipeline>, symbols: Vec<String>) -> Self {
        Self {
            pipeline,
            symbols: Arc::new(symbols),
            events: None,
            ticks: None,
        }
    }

    /// Forward outcomes, pump events and closed positions to `tx`
    pub fn with_events(mut self, tx: mpsc::Sender<RunnerEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Check exits on every tick received from `rx`
    pub fn with_ticks(mut self, rx: mpsc::Receiver<PriceTick>) -> Self {
        self.ticks = Some(rx);
        self
    }

    /// Run until `shutdown` resolves
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
        let runtime = self.pipeline.config().runtime.clone();
        let mut analysis = cadence(runtime.analysis_interval_secs);
        let mut pump_scan = cadence(self.pipeline.config().pump.scan_cooldown_secs);
        let mut exit_check = cadence(runtime.exit_check_interval_secs);

        let mut analysis_task: Option<JoinHandle<()>> = None;
        let mut pump_task: Option<JoinHandle<()>> = None;
        let mut exit_task: Option<JoinHandle<()>> = None;

        tracing::info!(
            symbols = ?self.symbols,
            analysis_secs = runtime.analysis_interval_secs,
            exit_check_secs = runtime.exit_check_interval_secs,
            streaming = self.ticks.is_some(),
            "Runner started"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }

                _ = analysis.tick() => {
                    if busy(&analysis_task, "analysis") {
                        continue;
                    }
                    let (pipeline, symbols, events) = self.task_context();
                    analysis_task = Some(tokio::spawn(async move {
                        for outcome in pipeline.run_cycle(&symbols).await {
                            emit(&events, RunnerEvent::Outcome(outcome)).await;
                        }
                    }));
                }

                _ = pump_scan.tick() => {
                    if busy(&pump_task, "pump scan") {
                        continue;
                    }
                    let (pipeline, symbols, events) = self.task_context();
                    pump_task = Some(tokio::spawn(async move {
                        for event in pipeline.run_pump_scan(&symbols).await {
                            emit(&events, RunnerEvent::Pump(event)).await;
                        }
                    }));
                }

                _ = exit_check.tick() => {
                    if busy(&exit_task, "exit check") {
                        continue;
                    }
                    let (pipeline, _, events) = self.task_context();
                    exit_task = Some(tokio::spawn(async move {
                        for position in pipeline.check_exits_from_market().await {
                            emit(&events, RunnerEvent::Closed(position)).await;
                        }
                    }));
                }

                tick = next_tick(&mut self.ticks) => match tick {
                    Some(tick) => {
                        for position in self.pipeline.on_tick(&tick).await {
                            emit(&self.events, RunnerEvent::Closed(position)).await;
                        }
                    }
                    None => {
                        tracing::warn!("Tick stream ended, relying on periodic exit checks");
                        self.ticks = None;
                    }
                },
            }
        }

        for task in [analysis_task, pump_task, exit_task].into_iter().flatten() {
            task.abort();
        }
        tracing::info!("Runner stopped");
        Ok(())
    }

    fn task_context(
        &self,
    ) -> (Arc<Pipeline>, Arc<Vec<String>>, Option<mpsc::Sender<RunnerEvent>>) {
        (
            Arc::clone(&self.pipeline),
            Arc::clone(&self.symbols),
            self.events.clone(),
        )
    }
}

fn cadence(secs: u64) -> tokio::time::Interval {
    let mut ticker = interval(Duration::from_secs(secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

fn busy(task: &Option<JoinHandle<()>>, name: &str) -> bool {
    let running = task.as_ref().is_some_and(|t| !t.is_finished());
    if running {
        tracing::debug!(cadence = name, "Previous run still in progress, skipping");
    }
    running
}

async fn next_tick(ticks: &mut Option<mpsc::Receiver<PriceTick>>) -> Option<PriceTick> {
    match ticks {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn emit(events: &Option<mpsc::Sender<RunnerEvent>>, event: RunnerEvent) {
    if let Some(tx) = events {
        if tx.send(event).await.is_err() {
            tracing::debug!("Runner event receiver dropped");
        }
    }
}
