//! Batch dispatch: build the network, solve, and publish the plan.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::RoutingConfig;
use crate::error::DispatchError;
use crate::models::{DemandRequest, Location, Vehicle};
use crate::network::NetworkBuilder;
use crate::solver::RoutingSolver;
use crate::store::{PlanStore, StoredPlan};

/// One batch routing job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub depot: Location,
    pub demands: Vec<DemandRequest>,
    pub fleet: Vec<Vehicle>,
    /// Overrides the configured search time budget.
    #[serde(default)]
    pub time_budget: Option<Duration>,
    /// Overrides the configured urgency weight α.
    #[serde(default)]
    pub urgency_weight: Option<f64>,
}

impl SolveRequest {
    pub fn new(depot: Location, demands: Vec<DemandRequest>, fleet: Vec<Vehicle>) -> Self {
        Self {
            depot,
            demands,
            fleet,
            time_budget: None,
            urgency_weight: None,
        }
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn with_urgency_weight(mut self, alpha: f64) -> Self {
        self.urgency_weight = Some(alpha);
        self
    }
}

/// Runs solves off the async executor and publishes their plans.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_fleet::config::{RoutingConfig, StoreConfig};
/// use u_fleet::dispatch::{Dispatcher, SolveRequest};
/// use u_fleet::models::{DemandRequest, Location, Vehicle};
/// use u_fleet::network::NetworkBuilder;
/// use u_fleet::store::{MemorySink, PlanStore};
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let store = Arc::new(PlanStore::new(Arc::new(MemorySink::new()), StoreConfig::default()));
/// let dispatcher = Dispatcher::new(
///     NetworkBuilder::haversine(),
///     RoutingConfig::default().with_max_iterations(50),
///     Arc::clone(&store),
/// );
///
/// let depot = Location::depot("dc", 0.0, 0.0).unwrap();
/// let a = Location::demand_node("a", 0.0, 0.1).unwrap();
/// let request = SolveRequest::new(
///     depot,
///     vec![DemandRequest::new(a, 20, 0.8).unwrap()],
///     vec![Vehicle::new(0, 50)],
/// );
///
/// let stored = dispatcher.dispatch(request).await.unwrap();
/// assert_eq!(stored.revision, 1);
/// assert_eq!(store.revision(), 1);
/// # });
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    builder: NetworkBuilder,
    config: RoutingConfig,
    store: Arc<PlanStore>,
}

impl Dispatcher {
    pub fn new(builder: NetworkBuilder, config: RoutingConfig, store: Arc<PlanStore>) -> Self {
        Self {
            builder,
            config,
            store,
        }
    }

    pub fn store(&self) -> &Arc<PlanStore> {
        &self.store
    }

    /// Builds and solves `request` on the blocking pool, then saves the
    /// plan. Nothing is published if any step fails.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Solve`] for bad input or an unservable request
    /// - [`DispatchError::Store`] if the plan could not be persisted
    /// - [`DispatchError::Join`] if the solver task panicked
    #[instrument(skip_all, fields(demands = request.demands.len(), fleet = request.fleet.len()))]
    pub async fn dispatch(&self, request: SolveRequest) -> Result<Arc<StoredPlan>, DispatchError> {
        let mut config = self.config.clone();
        if let Some(budget) = request.time_budget {
            config = config.with_time_budget(Some(budget));
        }
        if let Some(alpha) = request.urgency_weight {
            config = config.with_urgency_weight(alpha);
        }

        let builder = self.builder.clone();
        let plan = tokio::task::spawn_blocking(move || {
            let network = builder.build(&request.depot, &request.demands, &request.fleet)?;
            RoutingSolver::new(config).solve(&network)
        })
        .await??;

        let stored = self.store.save(plan).await?;
        info!(revision = stored.revision, "dispatch complete");
        Ok(stored)
    }
}
