//! Risk state persistence

use super::state::DailyRiskState;
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Persists the daily risk state and open positions across restarts
#[async_trait]
pub trait RiskStateStore: Send + Sync {
    /// `None` when nothing has been saved yet
    async fn load(&self) -> anyhow::Result<Option<DailyRiskState>>;
    async fn save(&self, state: &DailyRiskState) -> anyhow::Result<()>;
}

/// JSON file store; every write goes to its own sibling temp file and is
/// renamed into place
///
/// Also backs the pump history, see `PumpHistoryStore`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }

    /// `None` when the file does not exist; `what` names the content in errors
    pub(crate) async fn read_json<T: DeserializeOwned>(&self, what: &str) -> anyhow::Result<Option<T>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()))
            }
        };
        let value = serde_json::from_str(&content)
            .with_context(|| format!("corrupt {what} in {}", self.path.display()))?;
        Ok(Some(value))
    }

    pub(crate) async fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(value)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("failed to replace {}", self.path.display()));
        }
        Ok(())
    }
}

#[async_trait]
impl RiskStateStore for JsonFileStore {
    async fn load(&self) -> anyhow::Result<Option<DailyRiskState>> {
        self.read_json("risk state").await
    }

    async fn save(&self, state: &DailyRiskState) -> anyhow::Result<()> {
        self.write_json(state).await?;
        tracing::debug!(path = %self.path.display(), "Risk state saved");
        Ok(())
    }
}
