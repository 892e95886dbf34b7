//! Route plans and their aggregate metrics.

use serde::{Deserialize, Serialize};

use super::{Location, Route};

/// Why a demand node was left out of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Its demand exceeds the largest vehicle capacity.
    Unservable,
    /// Total demand exceeded total fleet capacity and it had the lowest
    /// urgency.
    CapacityShortfall,
    /// Total capacity sufficed but the remaining room was fragmented
    /// across vehicles.
    PackingShortfall,
}

/// A demand node that no route serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedDemand {
    pub location: Location,
    pub quantity: u32,
    pub urgency: f64,
    pub reason: DropReason,
}

/// How the improvement search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// No improvement for the configured number of rounds.
    Converged,
    /// The round cap was reached.
    IterationLimit,
    /// The time budget ran out; the plan is the best found so far.
    TimeBudgetExhausted,
}

/// Fleet-level figures for a plan. Cost and emissions are linear in
/// distance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanMetrics {
    pub total_distance_km: f64,
    pub fuel_cost: f64,
    pub emissions_kg: f64,
    pub total_duration_h: f64,
    pub served_quantity: u64,
    pub dropped_quantity: u64,
}

/// The outcome of one solve. Plans are never mutated after creation; a new
/// solve produces a new plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    routes: Vec<Route>,
    dropped: Vec<DroppedDemand>,
    metrics: PlanMetrics,
    status: SearchStatus,
    objective: f64,
    iterations: usize,
}

impl RoutePlan {
    pub fn new(
        routes: Vec<Route>,
        dropped: Vec<DroppedDemand>,
        metrics: PlanMetrics,
        status: SearchStatus,
        objective: f64,
        iterations: usize,
    ) -> Self {
        Self {
            routes,
            dropped,
            metrics,
            status,
            objective,
            iterations,
        }
    }

    /// Non-empty routes, one per vehicle used.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Demand nodes left unserved.
    pub fn dropped(&self) -> &[DroppedDemand] {
        &self.dropped
    }

    pub fn metrics(&self) -> &PlanMetrics {
        &self.metrics
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// Priority-weighted cost of the routes.
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Guided local search rounds performed.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// `true` when some demand could not be served.
    pub fn is_partial(&self) -> bool {
        !self.dropped.is_empty()
    }

    /// The route driven by a vehicle, if it has one.
    pub fn route_for(&self, vehicle_id: usize) -> Option<&Route> {
        self.routes.iter().find(|r| r.vehicle().id() == vehicle_id)
    }

    /// Number of stops across all routes.
    pub fn num_served(&self) -> usize {
        self.routes.iter().map(|r| r.num_stops()).sum()
    }
}
