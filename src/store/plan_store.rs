//! The route plan store: persist, then publish atomically.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::RoutePlan;

use super::PlanSink;

/// A plan as published by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlan {
    /// Increases by one with every successful save.
    pub revision: u64,
    pub saved_at: DateTime<Utc>,
    pub plan: RoutePlan,
}

/// Holds the current route plan.
///
/// Readers get an `Arc` snapshot that stays valid however many saves
/// happen afterwards. A save first persists through the [`PlanSink`] and
/// only then swaps the published value, so readers never observe a plan
/// that failed to persist.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_fleet::config::StoreConfig;
/// use u_fleet::models::{PlanMetrics, RoutePlan, SearchStatus};
/// use u_fleet::store::{MemorySink, PlanStore};
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let store = PlanStore::new(Arc::new(MemorySink::new()), StoreConfig::default());
/// assert!(store.latest().is_none());
///
/// let plan = RoutePlan::new(vec![], vec![], PlanMetrics::default(), SearchStatus::Converged, 0.0, 0);
/// let stored = store.save(plan.clone()).await.unwrap();
/// assert_eq!(stored.revision, 1);
/// assert_eq!(store.latest().unwrap().plan, plan);
/// # });
/// ```
pub struct PlanStore {
    sink: Arc<dyn PlanSink>,
    config: StoreConfig,
    current: watch::Sender<Option<Arc<StoredPlan>>>,
    /// Last published revision; held for the whole save so saves publish
    /// in revision order.
    save_lock: Mutex<u64>,
}

impl PlanStore {
    /// Creates an empty store.
    pub fn new(sink: Arc<dyn PlanSink>, config: StoreConfig) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            sink,
            config,
            current,
            save_lock: Mutex::new(0),
        }
    }

    /// Creates a store that starts out publishing a previously persisted
    /// plan. Later saves continue from its revision.
    pub fn seeded(sink: Arc<dyn PlanSink>, config: StoreConfig, stored: StoredPlan) -> Self {
        let revision = stored.revision;
        let (current, _) = watch::channel(Some(Arc::new(stored)));
        Self {
            sink,
            config,
            current,
            save_lock: Mutex::new(revision),
        }
    }

    /// Persists `plan` and publishes it as the new current plan.
    ///
    /// Persistence is retried up to `max_attempts` times with doubling
    /// delays. Concurrent saves are serialized.
    ///
    /// # Errors
    ///
    /// [`StoreError::RetriesExhausted`] carrying the unsaved plan when every
    /// attempt failed. The published plan is left unchanged.
    pub async fn save(&self, plan: RoutePlan) -> Result<Arc<StoredPlan>, StoreError> {
        let mut last_revision = self.save_lock.lock().await;
        let stored = StoredPlan {
            revision: *last_revision + 1,
            saved_at: Utc::now(),
            plan,
        };

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = self.sink.persist(&stored).await;
            match outcome {
                Ok(()) => break,
                Err(e) if attempt >= max_attempts => {
                    warn!(
                        revision = stored.revision,
                        attempts = attempt,
                        error = %e,
                        "giving up on plan save"
                    );
                    return Err(StoreError::RetriesExhausted {
                        attempts: attempt,
                        last_error: e.to_string(),
                        plan: Arc::new(stored.plan),
                    });
                }
                Err(e) => {
                    let delay = self.config.retry_delay(attempt);
                    warn!(
                        revision = stored.revision,
                        attempt,
                        ?delay,
                        error = %e,
                        "plan save failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        *last_revision = stored.revision;
        let stored = Arc::new(stored);
        self.current.send_replace(Some(Arc::clone(&stored)));
        info!(
            revision = stored.revision,
            routes = stored.plan.routes().len(),
            dropped = stored.plan.dropped().len(),
            "route plan published"
        );
        Ok(stored)
    }

    /// The current plan, or `None` before the first successful save.
    pub fn latest(&self) -> Option<Arc<StoredPlan>> {
        self.current.borrow().clone()
    }

    /// A receiver notified on every publish.
    pub fn watch(&self) -> watch::Receiver<Option<Arc<StoredPlan>>> {
        self.current.subscribe()
    }

    /// Revision of the current plan (0 when empty).
    pub fn revision(&self) -> u64 {
        self.current.borrow().as_ref().map_or(0, |s| s.revision)
    }
}
