//! The priority-weighted CVRP solver.
//!
//! # Algorithm
//!
//! 1. Admission: drop demand no vehicle can carry, then shed the lowest
//!    urgency demand until the rest fits in the fleet's total capacity.
//! 2. Construction: capacity-aware cheapest insertion under the
//!    priority-weighted cost.
//! 3. Improvement: guided local search over 2-opt, Or-opt and relocate.
//! 4. Extraction: node sequences become [`Route`](crate::models::Route)s
//!    with legs, timing and fleet metrics.
//!
//! Each call owns all of its working state, so independent solves can run
//! in parallel on separate threads.

use std::time::Instant;

use tracing::{error, info};

use crate::config::RoutingConfig;
use crate::constructive::{admit, cheapest_insertion};
use crate::error::SolveError;
use crate::evaluation::{validate_plan, PriorityCost};
use crate::local_search::GuidedLocalSearch;
use crate::models::RoutePlan;
use crate::network::RoutingNetwork;

use super::extract::extract;

/// Solves routing networks with a fixed configuration.
///
/// # Examples
///
/// ```
/// use u_fleet::config::RoutingConfig;
/// use u_fleet::models::{DemandRequest, Location, Vehicle};
/// use u_fleet::network::NetworkBuilder;
/// use u_fleet::solver::RoutingSolver;
///
/// let depot = Location::depot("dc", 0.0, 0.0).unwrap();
/// let demands = vec![
///     DemandRequest::new(Location::demand_node("a", 0.0, 0.1).unwrap(), 30, 0.9).unwrap(),
///     DemandRequest::new(Location::demand_node("b", 0.1, 0.1).unwrap(), 30, 0.2).unwrap(),
///     DemandRequest::new(Location::demand_node("c", 0.1, 0.0).unwrap(), 30, 0.5).unwrap(),
/// ];
/// let network = NetworkBuilder::haversine()
///     .build(&depot, &demands, &[Vehicle::new(0, 60), Vehicle::new(1, 60)])
///     .unwrap();
///
/// let solver = RoutingSolver::new(RoutingConfig::default().with_max_iterations(20));
/// let plan = solver.solve(&network).unwrap();
/// assert_eq!(plan.num_served(), 3);
/// assert!(!plan.is_partial());
/// for route in plan.routes() {
///     assert!(route.load() <= route.vehicle().capacity());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoutingSolver {
    config: RoutingConfig,
}

impl RoutingSolver {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Solves the network.
    ///
    /// A partial plan (some demand in [`RoutePlan::dropped`]) is a success;
    /// running out of time is reported through
    /// [`RoutePlan::status`], not as an error.
    ///
    /// # Errors
    ///
    /// - [`SolveError::Input`] if the configuration is out of range
    /// - [`SolveError::NoFeasibleSolution`] if no demand fits any vehicle
    pub fn solve(&self, network: &RoutingNetwork) -> Result<RoutePlan, SolveError> {
        self.config.validate()?;
        let started = Instant::now();
        // A budget past the end of the clock means no deadline.
        let deadline = self
            .config
            .time_budget()
            .and_then(|budget| started.checked_add(budget));

        let cost = PriorityCost::new(
            network.distances(),
            network.priorities(),
            self.config.urgency_weight,
            self.config.urgency_decay,
        );

        let admission = admit(network)?;
        let built = cheapest_insertion(network, &cost, &admission.admitted);

        let mut search = GuidedLocalSearch::new(network, &cost)
            .with_lambda(self.config.gls_lambda)
            .with_seed(self.config.seed)
            .with_stall_limit(self.config.stall_limit)
            .with_deadline(deadline);
        if let Some(rounds) = self.config.max_iterations {
            search = search.with_max_rounds(rounds);
        }
        let outcome = search.run(built.routes);

        let mut dropped = admission.dropped;
        dropped.extend(built.dropped);

        let plan = extract(
            network,
            &self.config,
            &outcome.routes,
            dropped,
            outcome.status,
            outcome.cost,
            outcome.rounds,
        );

        let violations = validate_plan(&plan, network);
        if !violations.is_empty() {
            error!(?violations, "solver produced an inconsistent plan");
        }

        let metrics = plan.metrics();
        info!(
            routes = plan.routes().len(),
            served = plan.num_served(),
            dropped = plan.dropped().len(),
            distance_km = metrics.total_distance_km,
            objective = plan.objective(),
            alpha = cost.alpha(),
            status = ?plan.status(),
            rounds = plan.iterations(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "solve finished"
        );

        Ok(plan)
    }
}
