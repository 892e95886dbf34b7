//! Capacity-aware cheapest insertion over a heterogeneous fleet.
//!
//! # Algorithm
//!
//! Start with one empty route per vehicle. Repeatedly evaluate every
//! (node, vehicle, position) triple that keeps the vehicle within capacity
//! and insert the one with the smallest increase in route cost. Ties keep
//! the first candidate found in node, vehicle, position order, so the
//! result is deterministic.
//!
//! When some node fits nowhere (the free capacity is fragmented across
//! vehicles), the lowest-urgency node of the whole admitted set, placed or
//! not, is dropped and insertion restarts from empty routes. A more urgent
//! node is therefore never given up to keep a less urgent one.
//!
//! # Complexity
//!
//! O(n² · m · n) route cost evaluations per pass, where m is the fleet
//! size, and at most n passes. Route costs are recomputed in full because
//! the urgency reward depends on stop position.
//!
//! # Reference
//!
//! Rosenkrantz, D.J., Stearns, R.E. & Lewis, P.M. (1977). "An analysis of
//! several heuristics for the traveling salesman problem", *SIAM Journal
//! on Computing* 6(3), 563-581.

use std::cmp::Ordering;

use tracing::debug;

use crate::evaluation::RouteCost;
use crate::models::{DropReason, DroppedDemand};
use crate::network::RoutingNetwork;

use super::admission::drop_node;

/// Routes built by cheapest insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Construction {
    /// One node sequence per vehicle, aligned with the fleet. May be empty.
    pub routes: Vec<Vec<usize>>,
    /// Nodes that could not be packed.
    pub dropped: Vec<DroppedDemand>,
}

/// Builds initial routes for the `admitted` nodes.
///
/// # Arguments
///
/// * `network` — The routing graph (depot at index 0)
/// * `cost` — Route cost model
/// * `admitted` — Node indices to place
///
/// # Examples
///
/// ```
/// use u_fleet::constructive::cheapest_insertion;
/// use u_fleet::evaluation::PriorityCost;
/// use u_fleet::models::{DemandRequest, Location, Vehicle};
/// use u_fleet::network::NetworkBuilder;
///
/// let depot = Location::depot("dc", 0.0, 0.0).unwrap();
/// let demands = vec![
///     DemandRequest::new(Location::demand_node("a", 0.0, 0.1).unwrap(), 30, 0.5).unwrap(),
///     DemandRequest::new(Location::demand_node("b", 0.0, 0.2).unwrap(), 30, 0.5).unwrap(),
/// ];
/// let network = NetworkBuilder::haversine()
///     .build(&depot, &demands, &[Vehicle::new(0, 40), Vehicle::new(1, 40)])
///     .unwrap();
/// let cost = PriorityCost::new(network.distances(), network.priorities(), 1.0, 0.5);
///
/// let built = cheapest_insertion(&network, &cost, &[1, 2]);
/// assert_eq!(built.routes.len(), 2);
/// assert_eq!(built.routes.iter().map(Vec::len).sum::<usize>(), 2);
/// assert!(built.dropped.is_empty());
/// ```
pub fn cheapest_insertion<C: RouteCost>(
    network: &RoutingNetwork,
    cost: &C,
    admitted: &[usize],
) -> Construction {
    let mut pool: Vec<usize> = admitted.to_vec();
    let mut dropped = Vec::new();

    loop {
        if let Some(routes) = insert_all(network, cost, &pool) {
            return Construction { routes, dropped };
        }
        let node = pool.remove(lowest_urgency(network, &pool));
        debug!(
            location = network.nodes()[node].id(),
            demand = network.demands()[node],
            "fleet capacity too fragmented; node dropped"
        );
        dropped.push(drop_node(network, node, DropReason::PackingShortfall));
    }
}

/// One insertion pass over `nodes`. Returns `None` as soon as a node has
/// no vehicle with room left.
fn insert_all<C: RouteCost>(
    network: &RoutingNetwork,
    cost: &C,
    nodes: &[usize],
) -> Option<Vec<Vec<usize>>> {
    let fleet = network.fleet();
    let demands = network.demands();

    let mut routes: Vec<Vec<usize>> = vec![Vec::new(); fleet.len()];
    let mut loads: Vec<u32> = vec![0; fleet.len()];
    let mut route_costs: Vec<f64> = vec![0.0; fleet.len()];
    let mut remaining: Vec<usize> = nodes.to_vec();
    let mut trial = Vec::new();

    while !remaining.is_empty() {
        // (remaining index, vehicle, position, delta)
        let mut best: Option<(usize, usize, usize, f64)> = None;

        for (ri, &node) in remaining.iter().enumerate() {
            for (vi, vehicle) in fleet.iter().enumerate() {
                if loads[vi].saturating_add(demands[node]) > vehicle.capacity() {
                    continue;
                }
                for pos in 0..=routes[vi].len() {
                    trial.clear();
                    trial.extend_from_slice(&routes[vi][..pos]);
                    trial.push(node);
                    trial.extend_from_slice(&routes[vi][pos..]);
                    let delta = cost.route_cost(&trial) - route_costs[vi];
                    if best.as_ref().is_none_or(|b| delta < b.3) {
                        best = Some((ri, vi, pos, delta));
                    }
                }
            }
        }

        let (ri, vi, pos, _) = best?;
        let node = remaining.remove(ri);
        routes[vi].insert(pos, node);
        loads[vi] += demands[node];
        route_costs[vi] = cost.route_cost(&routes[vi]);
    }

    Some(routes)
}

/// Position in `nodes` of the node to give up first: lowest urgency, then
/// larger quantity, then later index.
fn lowest_urgency(network: &RoutingNetwork, nodes: &[usize]) -> usize {
    let p = network.priorities();
    let q = network.demands();
    let mut pick = 0;
    for (i, &node) in nodes.iter().enumerate().skip(1) {
        let cur = nodes[pick];
        let worse = match p[node].partial_cmp(&p[cur]).unwrap_or(Ordering::Equal) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => q[node] > q[cur] || (q[node] == q[cur] && node > cur),
        };
        if worse {
            pick = i;
        }
    }
    pick
}
