//! Status command implementation

use super::build_pipeline;
use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::pump::PumpStatistics;
use crate::risk::{DailyRiskState, DailyStats};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct StatusReport {
    risk: DailyRiskState,
    daily: DailyStats,
    pumps: PumpStatistics,
}

/// Persisted risk state as of today, with the pump history summary
pub async fn execute(config: &Config) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config).await?;
    println!("{}", serde_json::to_string_pretty(&report(&pipeline).await)?);
    Ok(())
}

async fn report(pipeline: &Pipeline) -> StatusReport {
    StatusReport {
        risk: pipeline.daily_risk_state().await,
        daily: pipeline.daily_stats().await,
        pumps: pipeline.pump_statistics().await,
    }
}
