//! Demand admission against fleet capacity.
//!
//! # Algorithm
//!
//! 1. Any node whose demand exceeds the largest vehicle capacity can never
//!    be served and is dropped as [`DropReason::Unservable`].
//! 2. While the admitted demand exceeds the total fleet capacity, the node
//!    with the lowest urgency is dropped as [`DropReason::CapacityShortfall`].
//!    Ties go to the larger quantity, then to the later node index.
//!
//! # Complexity
//!
//! O(n log n) for the shortfall ordering.

use std::cmp::Ordering;

use tracing::{info, warn};

use crate::error::SolveError;
use crate::models::{DropReason, DroppedDemand};
use crate::network::RoutingNetwork;

/// Result of admission: the node indices that go on to construction and
/// the ones left out.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    /// Admitted node indices in ascending order.
    pub admitted: Vec<usize>,
    /// Nodes dropped before construction.
    pub dropped: Vec<DroppedDemand>,
}

/// Decides which demand nodes the fleet can take at all.
///
/// # Errors
///
/// [`SolveError::NoFeasibleSolution`] if no node fits in any vehicle.
///
/// # Examples
///
/// ```
/// use u_fleet::constructive::admit;
/// use u_fleet::models::{DemandRequest, DropReason, Location, Vehicle};
/// use u_fleet::network::NetworkBuilder;
///
/// let depot = Location::depot("dc", 0.0, 0.0).unwrap();
/// let demands = vec![
///     DemandRequest::new(Location::demand_node("a", 0.0, 0.1).unwrap(), 25, 0.9).unwrap(),
///     DemandRequest::new(Location::demand_node("b", 0.0, 0.2).unwrap(), 25, 0.5).unwrap(),
///     DemandRequest::new(Location::demand_node("c", 0.0, 0.3).unwrap(), 25, 0.1).unwrap(),
/// ];
/// let network = NetworkBuilder::haversine()
///     .build(&depot, &demands, &[Vehicle::new(0, 50)])
///     .unwrap();
///
/// let admission = admit(&network).unwrap();
/// assert_eq!(admission.admitted, vec![1, 2]);
/// assert_eq!(admission.dropped[0].location.id(), "c");
/// assert_eq!(admission.dropped[0].reason, DropReason::CapacityShortfall);
/// ```
pub fn admit(network: &RoutingNetwork) -> Result<Admission, SolveError> {
    let demands = network.demands();
    let priorities = network.priorities();
    let max_capacity = network
        .fleet()
        .iter()
        .map(|v| v.capacity())
        .max()
        .unwrap_or(0);

    let mut admitted = Vec::with_capacity(network.num_demand_nodes());
    let mut dropped = Vec::new();

    for node in 1..network.nodes().len() {
        if demands[node] > max_capacity {
            warn!(
                location = network.nodes()[node].id(),
                demand = demands[node],
                max_capacity,
                "demand exceeds every vehicle capacity"
            );
            dropped.push(drop_node(network, node, DropReason::Unservable));
        } else {
            admitted.push(node);
        }
    }

    if admitted.is_empty() {
        return Err(SolveError::NoFeasibleSolution { dropped });
    }

    let total_capacity = network.total_capacity();
    let mut admitted_demand: u64 = admitted.iter().map(|&i| u64::from(demands[i])).sum();

    if admitted_demand > total_capacity {
        // Drop order: lowest urgency first, then larger quantity, then later index.
        let mut order = admitted.clone();
        order.sort_by(|&a, &b| {
            priorities[a]
                .partial_cmp(&priorities[b])
                .unwrap_or(Ordering::Equal)
                .then(demands[b].cmp(&demands[a]))
                .then(b.cmp(&a))
        });

        let mut shed = Vec::new();
        for node in order {
            if admitted_demand <= total_capacity {
                break;
            }
            admitted_demand -= u64::from(demands[node]);
            shed.push(node);
            dropped.push(drop_node(network, node, DropReason::CapacityShortfall));
        }
        admitted.retain(|i| !shed.contains(i));

        info!(
            dropped = shed.len(),
            total_capacity,
            admitted_demand,
            "demand exceeds fleet capacity; lowest urgency nodes dropped"
        );
    }

    Ok(Admission { admitted, dropped })
}

/// Builds the [`DroppedDemand`] record for a node.
pub(crate) fn drop_node(network: &RoutingNetwork, node: usize, reason: DropReason) -> DroppedDemand {
    DroppedDemand {
        location: network.nodes()[node].clone(),
        quantity: network.demands()[node],
        urgency: network.priorities()[node],
        reason,
    }
}
