//! Model opinion sources

use crate::market::MarketSnapshot;
use crate::signal::AiSignal;
use crate::telemetry::{self, CounterMetric, LatencyMetric};
use async_trait::async_trait;
use futures_util::future::join_all;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// External model producing an opinion about one symbol
///
/// Failing or returning `None` simply means the source abstains.
#[async_trait]
pub trait ModelSignalSource: Send + Sync {
    /// Stable identifier used in consensus ordering
    fn id(&self) -> &str;

    async fn analyze(
        &self,
        symbol: &str,
        snapshot: &MarketSnapshot,
    ) -> anyhow::Result<Option<AiSignal>>;
}

/// Ask every source concurrently, each bounded by `timeout`
///
/// Waits for all calls to finish or time out. Failed, timed-out and
/// off-symbol answers are dropped and logged as degraded. Confidence is
/// clamped into [0, 1] whatever the source put there.
pub async fn collect_opinions(
    sources: &[Arc<dyn ModelSignalSource>],
    symbol: &str,
    snapshot: &MarketSnapshot,
    timeout: Duration,
) -> Vec<AiSignal> {
    let calls = sources.iter().map(|source| async move {
        let started = Instant::now();
        let result = tokio::time::timeout(timeout, source.analyze(symbol, snapshot)).await;
        telemetry::record_latency(LatencyMetric::ModelCall, started.elapsed());
        (source.id(), result)
    });

    let mut opinions = Vec::with_capacity(sources.len());
    for (id, result) in join_all(calls).await {
        match result {
            Ok(Ok(Some(mut opinion))) if opinion.symbol == symbol => {
                opinion.confidence = opinion.confidence.clamp(Decimal::ZERO, Decimal::ONE);
                opinions.push(opinion);
            }
            Ok(Ok(Some(opinion))) => {
                tracing::warn!(source = id, symbol, got = %opinion.symbol, "Source answered for wrong symbol");
                telemetry::increment(CounterMetric::DegradedSources);
            }
            Ok(Ok(None)) => tracing::debug!(source = id, symbol, "Source abstained"),
            Ok(Err(e)) => {
                tracing::warn!(source = id, symbol, error = %e, "Model source degraded: call failed");
                telemetry::increment(CounterMetric::DegradedSources);
            }
            Err(_) => {
                tracing::warn!(source = id, symbol, timeout_ms = timeout.as_millis() as u64, "Model source degraded: timed out");
                telemetry::increment(CounterMetric::DegradedSources);
            }
        }
    }
    opinions
}
