//! Conversion of solver sequences into an immutable [`RoutePlan`].

use crate::config::RoutingConfig;
use crate::evaluation::RouteEvaluator;
use crate::models::{DroppedDemand, PlanMetrics, Route, RoutePlan, SearchStatus};
use crate::network::RoutingNetwork;

/// Turns per-vehicle node sequences into a plan with legs and metrics.
///
/// `sequences` must be aligned with `network.fleet()`; empty sequences
/// produce no route.
pub fn extract(
    network: &RoutingNetwork,
    config: &RoutingConfig,
    sequences: &[Vec<usize>],
    dropped: Vec<DroppedDemand>,
    status: SearchStatus,
    objective: f64,
    iterations: usize,
) -> RoutePlan {
    let evaluator = RouteEvaluator::new(network, config);
    let routes: Vec<Route> = sequences
        .iter()
        .zip(network.fleet())
        .filter(|(seq, _)| !seq.is_empty())
        .map(|(seq, vehicle)| evaluator.build_route(vehicle, seq).0)
        .collect();

    let metrics = plan_metrics(&routes, &dropped, config);
    RoutePlan::new(routes, dropped, metrics, status, objective, iterations)
}

/// Fleet-level figures. Fuel cost and emissions are linear in distance.
pub fn plan_metrics(
    routes: &[Route],
    dropped: &[DroppedDemand],
    config: &RoutingConfig,
) -> PlanMetrics {
    let total_distance_km: f64 = routes.iter().map(|r| r.distance_km()).sum();
    PlanMetrics {
        total_distance_km,
        fuel_cost: total_distance_km * config.fuel_cost_per_km,
        emissions_kg: total_distance_km * config.emissions_kg_per_km,
        total_duration_h: routes.iter().map(|r| r.duration_h()).sum(),
        served_quantity: routes.iter().map(|r| u64::from(r.load())).sum(),
        dropped_quantity: dropped.iter().map(|d| u64::from(d.quantity)).sum(),
    }
}
