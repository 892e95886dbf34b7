//! Persistence collaborators for route plans.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::StoreError;

use super::StoredPlan;

/// Where saved plans are written. Implementations must be safe to call
/// from several tasks; the store serializes its own calls.
#[async_trait]
pub trait PlanSink: Send + Sync {
    /// Writes one plan revision durably.
    async fn persist(&self, stored: &StoredPlan) -> Result<(), StoreError>;
}

/// Keeps every persisted revision in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    history: Mutex<Vec<StoredPlan>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every persisted revision, oldest first.
    pub fn history(&self) -> Vec<StoredPlan> {
        self.history.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }
}

#[async_trait]
impl PlanSink for MemorySink {
    async fn persist(&self, stored: &StoredPlan) -> Result<(), StoreError> {
        self.history.lock().push(stored.clone());
        Ok(())
    }
}

/// Writes the latest plan as JSON into a directory.
///
/// The file is written to a temporary name and renamed over `latest.json`,
/// so readers see either the old or the new plan, never a partial file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    const LATEST: &'static str = "latest.json";
    const TEMP: &'static str = "latest.json.tmp";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the current plan file.
    pub fn latest_path(&self) -> PathBuf {
        self.dir.join(Self::LATEST)
    }

    /// Reads back the last persisted plan, if any.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] for read failures other than a missing file,
    /// [`StoreError::Serialize`] for a corrupt file.
    pub async fn load_latest(&self) -> Result<Option<StoredPlan>, StoreError> {
        match tokio::fs::read(self.latest_path()).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PlanSink for JsonFileSink {
    async fn persist(&self, stored: &StoredPlan) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(stored)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let temp = self.dir.join(Self::TEMP);
        tokio::fs::write(&temp, &json).await?;
        tokio::fs::rename(&temp, self.latest_path()).await?;
        debug!(
            revision = stored.revision,
            bytes = json.len(),
            path = %self.latest_path().display(),
            "plan written"
        );
        Ok(())
    }
}
