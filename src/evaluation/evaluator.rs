//! Route evaluator that computes legs, timing, load, and feasibility.

use std::collections::HashMap;

use crate::config::RoutingConfig;
use crate::models::{Route, RouteLeg, RoutePlan, Vehicle};
use crate::network::RoutingNetwork;

/// A type of constraint violation in a route or plan.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationType {
    /// Delivered quantity exceeds the vehicle's capacity at some point.
    CapacityExceeded {
        /// Vehicle whose route is overloaded.
        vehicle_id: usize,
        /// Load that exceeded capacity.
        load: u32,
        /// Vehicle capacity.
        capacity: u32,
    },
    /// A location is visited more than once across the plan.
    DuplicateVisit {
        /// Location id.
        location_id: String,
        /// Number of visits.
        visits: usize,
    },
    /// A demand node is neither served nor listed as dropped.
    Unserved {
        /// Location id.
        location_id: String,
    },
    /// A node is both served and listed as dropped.
    ServedAndDropped {
        /// Location id.
        location_id: String,
    },
    /// A route does not start or end at the depot.
    DetachedFromDepot {
        /// Vehicle whose route is broken.
        vehicle_id: usize,
    },
}

/// A constraint violation in a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// The type of violation.
    pub kind: ViolationType,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationType) -> Self {
        Self { kind }
    }
}

/// Turns node sequences into [`Route`]s with legs, timing, and load, and
/// checks capacity along the way.
///
/// # Examples
///
/// ```
/// use u_fleet::config::RoutingConfig;
/// use u_fleet::evaluation::RouteEvaluator;
/// use u_fleet::models::{DemandRequest, Location, Vehicle};
/// use u_fleet::network::NetworkBuilder;
///
/// let depot = Location::depot("dc", 0.0, 0.0).unwrap();
/// let a = Location::demand_node("a", 0.0, 1.0).unwrap();
/// let network = NetworkBuilder::haversine()
///     .build(&depot, &[DemandRequest::new(a, 40, 0.5).unwrap()], &[Vehicle::new(0, 100)])
///     .unwrap();
///
/// let config = RoutingConfig::default();
/// let evaluator = RouteEvaluator::new(&network, &config);
/// let (route, violations) = evaluator.build_route(&network.fleet()[0], &[1]);
/// assert_eq!(route.legs().len(), 2);
/// assert_eq!(route.load(), 40);
/// assert!(violations.is_empty());
/// ```
pub struct RouteEvaluator<'a> {
    network: &'a RoutingNetwork,
    config: &'a RoutingConfig,
}

impl<'a> RouteEvaluator<'a> {
    /// Creates a new evaluator for the given network and timing parameters.
    pub fn new(network: &'a RoutingNetwork, config: &'a RoutingConfig) -> Self {
        Self { network, config }
    }

    /// Builds a route from a sequence of node indices (depot excluded).
    ///
    /// Returns the constructed route and any capacity violation found.
    pub fn build_route(&self, vehicle: &Vehicle, nodes: &[usize]) -> (Route, Vec<Violation>) {
        let mut route = Route::new(vehicle.clone());
        let mut violations = Vec::new();
        if nodes.is_empty() {
            return (route, violations);
        }

        let locations = self.network.nodes();
        let distances = self.network.distances();
        let mut delivered: u32 = 0;
        let mut prev = 0;

        for &node in nodes {
            let d = distances.get(prev, node);
            delivered = delivered.saturating_add(self.network.demands()[node]);
            if delivered > vehicle.capacity()
                && !violations.iter().any(|v: &Violation| {
                    matches!(v.kind, ViolationType::CapacityExceeded { .. })
                })
            {
                violations.push(Violation::new(ViolationType::CapacityExceeded {
                    vehicle_id: vehicle.id(),
                    load: delivered,
                    capacity: vehicle.capacity(),
                }));
            }
            route.push_leg(RouteLeg {
                from: locations[prev].clone(),
                to: locations[node].clone(),
                distance_km: d,
                travel_time_h: d / self.config.average_speed_kmh + self.config.service_time_h,
                delivered_after: delivered,
                urgency: self.network.priorities()[node],
            });
            prev = node;
        }

        // Return to depot
        let d = distances.get(prev, 0);
        route.push_leg(RouteLeg {
            from: locations[prev].clone(),
            to: locations[0].clone(),
            distance_km: d,
            travel_time_h: d / self.config.average_speed_kmh,
            delivered_after: delivered,
            urgency: 0.0,
        });

        (route, violations)
    }
}

/// Checks a plan against the network it was solved on: prefix capacity,
/// depot anchoring, and exactly-once coverage of every demand node.
///
/// An empty result means the plan is consistent.
pub fn validate_plan(plan: &RoutePlan, network: &RoutingNetwork) -> Vec<Violation> {
    let mut violations = Vec::new();
    let depot_id = network.depot().id();
    let mut visits: HashMap<&str, usize> = HashMap::new();

    for route in plan.routes() {
        let vehicle = route.vehicle();
        let legs = route.legs();
        let anchored = legs.first().is_some_and(|l| l.from.id() == depot_id)
            && legs.last().is_some_and(|l| l.to.id() == depot_id);
        if !anchored {
            violations.push(Violation::new(ViolationType::DetachedFromDepot {
                vehicle_id: vehicle.id(),
            }));
        }

        let mut load: u32 = 0;
        for stop in route.stops() {
            let demand = network
                .index_of(stop.id())
                .map_or(0, |i| network.demands()[i]);
            load = load.saturating_add(demand);
            if load > vehicle.capacity() {
                violations.push(Violation::new(ViolationType::CapacityExceeded {
                    vehicle_id: vehicle.id(),
                    load,
                    capacity: vehicle.capacity(),
                }));
                break;
            }
        }
        for stop in route.stops() {
            *visits.entry(stop.id()).or_insert(0) += 1;
        }
    }

    for node in &network.nodes()[1..] {
        let served = visits.get(node.id()).copied().unwrap_or(0);
        let dropped = plan.dropped().iter().any(|d| d.location.id() == node.id());
        match (served, dropped) {
            (0, false) => violations.push(Violation::new(ViolationType::Unserved {
                location_id: node.id().to_string(),
            })),
            (0, true) | (1, false) => {}
            (1, true) => violations.push(Violation::new(ViolationType::ServedAndDropped {
                location_id: node.id().to_string(),
            })),
            (n, _) => violations.push(Violation::new(ViolationType::DuplicateVisit {
                location_id: node.id().to_string(),
                visits: n,
            })),
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DemandRequest, DropReason, DroppedDemand, Location, PlanMetrics, SearchStatus,
    };
    use crate::network::NetworkBuilder;

    fn setup(capacity: u32) -> RoutingNetwork {
        let depot = Location::depot("dc", 0.0, 0.0).expect("valid");
        let demands = vec![
            DemandRequest::new(Location::demand_node("a", 0.0, 1.0).expect("valid"), 10, 0.5)
                .expect("valid"),
            DemandRequest::new(Location::demand_node("b", 0.0, 2.0).expect("valid"), 20, 0.5)
                .expect("valid"),
            DemandRequest::new(Location::demand_node("c", 1.0, 2.0).expect("valid"), 15, 0.5)
                .expect("valid"),
        ];
        NetworkBuilder::haversine()
            .build(&depot, &demands, &[Vehicle::new(0, capacity)])
            .expect("valid")
    }

    fn plan(routes: Vec<Route>, dropped: Vec<DroppedDemand>) -> RoutePlan {
        RoutePlan::new(
            routes,
            dropped,
            PlanMetrics::default(),
            SearchStatus::Converged,
            0.0,
            0,
        )
    }

    #[test]
    fn test_build_route_empty() {
        let net = setup(50);
        let cfg = RoutingConfig::default();
        let eval = RouteEvaluator::new(&net, &cfg);
        let (route, violations) = eval.build_route(&net.fleet()[0], &[]);
        assert!(route.is_empty());
        assert!(violations.is_empty());
    }

    #[test]
    fn test_build_route_timing() {
        let net = setup(50);
        let cfg = RoutingConfig::default();
        let eval = RouteEvaluator::new(&net, &cfg);
        let (route, _) = eval.build_route(&net.fleet()[0], &[1]);
        let out = &route.legs()[0];
        let back = &route.legs()[1];
        assert!((out.travel_time_h - (out.distance_km / 60.0 + 0.25)).abs() < 1e-12);
        assert!((back.travel_time_h - back.distance_km / 60.0).abs() < 1e-12);
        assert_eq!(back.to.id(), "dc");
        assert_eq!(out.urgency, 0.5);
    }

    #[test]
    fn test_build_route_capacity_violated() {
        let net = setup(25);
        let cfg = RoutingConfig::default();
        let eval = RouteEvaluator::new(&net, &cfg);
        // 10 + 20 + 15 = 45 > 25
        let (route, violations) = eval.build_route(&net.fleet()[0], &[1, 2, 3]);
        assert_eq!(route.num_stops(), 3);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            violations[0].kind,
            ViolationType::CapacityExceeded {
                load: 30,
                capacity: 25,
                ..
            }
        ));
    }

    #[test]
    fn test_build_route_within_capacity() {
        let net = setup(50);
        let cfg = RoutingConfig::default();
        let eval = RouteEvaluator::new(&net, &cfg);
        let (route, violations) = eval.build_route(&net.fleet()[0], &[1, 2]);
        assert!(violations.is_empty());
        let delivered: Vec<u32> = route.legs().iter().map(|l| l.delivered_after).collect();
        assert_eq!(delivered, vec![10, 30, 30]);
    }

    #[test]
    fn test_validate_plan_clean() {
        let net = setup(50);
        let cfg = RoutingConfig::default();
        let eval = RouteEvaluator::new(&net, &cfg);
        let (route, _) = eval.build_route(&net.fleet()[0], &[1, 2, 3]);
        assert!(validate_plan(&plan(vec![route], vec![]), &net).is_empty());
    }

    #[test]
    fn test_validate_plan_detects_problems() {
        let net = setup(50);
        let cfg = RoutingConfig::default();
        let eval = RouteEvaluator::new(&net, &cfg);
        let (r1, _) = eval.build_route(&net.fleet()[0], &[1, 1]);
        let dropped = DroppedDemand {
            location: net.nodes()[1].clone(),
            quantity: 10,
            urgency: 0.5,
            reason: DropReason::CapacityShortfall,
        };
        let violations = validate_plan(&plan(vec![r1], vec![dropped]), &net);
        let kinds: Vec<_> = violations.iter().map(|v| &v.kind).collect();
        assert!(kinds.iter().any(|k| matches!(k, ViolationType::DuplicateVisit { visits: 2, .. })));
        assert!(kinds
            .iter()
            .any(|k| matches!(k, ViolationType::Unserved { location_id } if location_id == "b")));
        assert!(kinds
            .iter()
            .any(|k| matches!(k, ViolationType::Unserved { location_id } if location_id == "c")));
    }

    #[test]
    fn test_validate_plan_capacity() {
        let net = setup(25);
        let cfg = RoutingConfig::default();
        let eval = RouteEvaluator::new(&net, &cfg);
        let (route, _) = eval.build_route(&net.fleet()[0], &[1, 2, 3]);
        let violations = validate_plan(&plan(vec![route], vec![]), &net);
        assert!(violations
            .iter()
            .any(|v| matches!(v.kind, ViolationType::CapacityExceeded { .. })));
    }
}
