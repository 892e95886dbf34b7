//! Turns depot, demand requests, and the fleet roster into a routing graph.
//!
//! # Aggregation
//!
//! Requests are grouped by location id in first-seen order. Quantities are
//! summed; urgency is the mean over the location's requests. Locations
//! whose total quantity is zero are left out of the graph so the solver
//! never sees them.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::distance::{DistanceMatrix, DistanceProvider, Haversine};
use crate::error::{InputError, SolveError};
use crate::models::{DemandRequest, Location, LocationRole, Vehicle};

/// A routing graph: node 0 is the depot, nodes 1..=N are demand locations.
///
/// `demands` and `priorities` are aligned with the matrix indices.
#[derive(Debug, Clone)]
pub struct RoutingNetwork {
    nodes: Vec<Location>,
    distances: DistanceMatrix,
    demands: Vec<u32>,
    priorities: Vec<f64>,
    fleet: Vec<Vehicle>,
}

impl RoutingNetwork {
    /// Assembles a network from parts that are already aligned.
    ///
    /// Returns `None` if the lengths disagree or there is no depot node.
    pub fn from_parts(
        nodes: Vec<Location>,
        distances: DistanceMatrix,
        demands: Vec<u32>,
        priorities: Vec<f64>,
        fleet: Vec<Vehicle>,
    ) -> Option<Self> {
        let n = nodes.len();
        if n == 0 || distances.size() != n || demands.len() != n || priorities.len() != n {
            return None;
        }
        Some(Self {
            nodes,
            distances,
            demands,
            priorities,
            fleet,
        })
    }

    /// All nodes, depot first.
    pub fn nodes(&self) -> &[Location] {
        &self.nodes
    }

    pub fn depot(&self) -> &Location {
        &self.nodes[0]
    }

    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    /// Aggregated demand per node (0 for the depot).
    pub fn demands(&self) -> &[u32] {
        &self.demands
    }

    /// Mean urgency per node (0 for the depot).
    pub fn priorities(&self) -> &[f64] {
        &self.priorities
    }

    pub fn fleet(&self) -> &[Vehicle] {
        &self.fleet
    }

    /// Number of demand nodes (excluding the depot).
    pub fn num_demand_nodes(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Index of a node by location id.
    pub fn index_of(&self, location_id: &str) -> Option<usize> {
        self.nodes.iter().position(|l| l.id() == location_id)
    }

    /// Total units requested across all demand nodes.
    pub fn total_demand(&self) -> u64 {
        self.demands.iter().map(|&d| u64::from(d)).sum()
    }

    /// Total capacity of the fleet.
    pub fn total_capacity(&self) -> u64 {
        self.fleet.iter().map(|v| u64::from(v.capacity())).sum()
    }
}

/// Builds [`RoutingNetwork`]s over a pluggable distance source.
///
/// # Examples
///
/// ```
/// use u_fleet::models::{DemandRequest, Location, Vehicle};
/// use u_fleet::network::NetworkBuilder;
///
/// let depot = Location::depot("dc", 0.0, 0.0).unwrap();
/// let a = Location::demand_node("a", 0.0, 1.0).unwrap();
/// let demands = vec![
///     DemandRequest::new(a.clone(), 30, 0.9).unwrap(),
///     DemandRequest::new(a, 20, 0.5).unwrap(),
/// ];
///
/// let network = NetworkBuilder::haversine()
///     .build(&depot, &demands, &[Vehicle::new(0, 100)])
///     .unwrap();
/// assert_eq!(network.num_demand_nodes(), 1);
/// assert_eq!(network.demands(), &[0, 50]);
/// assert!((network.priorities()[1] - 0.7).abs() < 1e-12);
/// ```
#[derive(Clone)]
pub struct NetworkBuilder {
    provider: Arc<dyn DistanceProvider>,
}

impl NetworkBuilder {
    /// Creates a builder over the given distance source.
    pub fn new(provider: Arc<dyn DistanceProvider>) -> Self {
        Self { provider }
    }

    /// Creates a builder using great-circle distances.
    pub fn haversine() -> Self {
        Self::new(Arc::new(Haversine))
    }

    /// Builds the routing graph.
    ///
    /// # Errors
    ///
    /// - [`InputError::InvalidCoordinate`] for any out-of-range coordinate
    /// - [`InputError::InvalidRole`] if `depot` is not a depot
    /// - [`InputError::InsufficientData`] if no location has positive demand
    /// - [`InputError::EmptyFleet`] / [`InputError::InvalidVehicle`] for a bad roster
    /// - [`InputError::QuantityOverflow`] if one location's requests exceed `u32::MAX`
    /// - [`SolveError::Provider`] if the distance source fails
    pub fn build(
        &self,
        depot: &Location,
        demands: &[DemandRequest],
        fleet: &[Vehicle],
    ) -> Result<RoutingNetwork, SolveError> {
        depot.point().validate(depot.id())?;
        if depot.role() != LocationRole::Depot {
            return Err(InputError::InvalidRole {
                id: depot.id().to_string(),
                expected: LocationRole::Depot,
                found: depot.role(),
            }
            .into());
        }
        if fleet.is_empty() {
            return Err(InputError::EmptyFleet.into());
        }
        for vehicle in fleet {
            vehicle.validate()?;
        }

        let aggregated = aggregate(depot, demands)?;
        if aggregated.is_empty() {
            return Err(InputError::InsufficientData(format!(
                "{} request(s) but no location with positive demand",
                demands.len()
            ))
            .into());
        }

        let mut nodes = Vec::with_capacity(aggregated.len() + 1);
        let mut node_demands = Vec::with_capacity(aggregated.len() + 1);
        let mut priorities = Vec::with_capacity(aggregated.len() + 1);
        nodes.push(depot.clone());
        node_demands.push(0);
        priorities.push(0.0);
        for agg in aggregated {
            priorities.push(agg.urgency_sum / agg.requests as f64);
            node_demands.push(agg.quantity);
            nodes.push(agg.location);
        }

        let points: Vec<_> = nodes.iter().map(|l| l.point()).collect();
        let distances = DistanceMatrix::from_points(&points, self.provider.as_ref())?;

        debug!(
            nodes = nodes.len(),
            total_demand = node_demands.iter().map(|&d| u64::from(d)).sum::<u64>(),
            vehicles = fleet.len(),
            "routing network built"
        );

        Ok(RoutingNetwork {
            nodes,
            distances,
            demands: node_demands,
            priorities,
            fleet: fleet.to_vec(),
        })
    }
}

struct Aggregate {
    location: Location,
    quantity: u32,
    urgency_sum: f64,
    requests: usize,
}

fn aggregate(depot: &Location, demands: &[DemandRequest]) -> Result<Vec<Aggregate>, InputError> {
    let mut order: Vec<Aggregate> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for req in demands {
        req.validate()?;
        let loc = req.location();
        if loc.id() == depot.id() {
            warn!(
                location = loc.id(),
                quantity = req.quantity(),
                "ignoring demand recorded at the depot"
            );
            continue;
        }
        match index.get(loc.id()) {
            Some(&i) => {
                let agg = &mut order[i];
                if agg.location.point() != loc.point() {
                    return Err(InputError::ConflictingLocation(loc.id().to_string()));
                }
                agg.quantity = agg
                    .quantity
                    .checked_add(req.quantity())
                    .ok_or_else(|| InputError::QuantityOverflow(loc.id().to_string()))?;
                agg.urgency_sum += req.urgency();
                agg.requests += 1;
            }
            None => {
                index.insert(loc.id(), order.len());
                order.push(Aggregate {
                    location: Location::new(
                        loc.id(),
                        loc.point().lat(),
                        loc.point().lon(),
                        LocationRole::DemandNode,
                    )?,
                    quantity: req.quantity(),
                    urgency_sum: req.urgency(),
                    requests: 1,
                });
            }
        }
    }

    order.retain(|agg| agg.quantity > 0);
    Ok(order)
}
