//! Pump history persistence

use super::types::PumpEvent;
use crate::risk::JsonFileStore;
use async_trait::async_trait;

/// Keeps recent pump events across restarts so cooldowns still apply
#[async_trait]
pub trait PumpHistoryStore: Send + Sync {
    /// `None` when nothing has been saved yet
    async fn load_history(&self) -> anyhow::Result<Option<Vec<PumpEvent>>>;
    async fn save_history(&self, events: &[PumpEvent]) -> anyhow::Result<()>;
}

#[async_trait]
impl PumpHistoryStore for JsonFileStore {
    async fn load_history(&self) -> anyhow::Result<Option<Vec<PumpEvent>>> {
        self.read_json("pump history").await
    }

    async fn save_history(&self, events: &[PumpEvent]) -> anyhow::Result<()> {
        self.write_json(events).await?;
        tracing::debug!(path = %self.path().display(), events = events.len(), "Pump history saved");
        Ok(())
    }
}
