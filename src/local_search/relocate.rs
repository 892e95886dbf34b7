//! Inter-route stop relocation operator.
//!
//! # Algorithm
//!
//! Tries moving each stop from its current route to every position of every
//! other vehicle's route (including empty ones). Accepts the first move that
//! reduces the combined cost of the two routes and keeps the receiving
//! vehicle within its capacity.
//!
//! # Complexity
//!
//! O(n² × m) candidates per pass, each priced in O(n), where m is the fleet
//! size.
//!
//! # Reference
//!
//! Savelsbergh, M.W.P. (1992). "The Vehicle Routing Problem with Time
//! Windows: Minimizing Route Duration", *ORSA Journal on Computing* 4(2),
//! 146-154.

use crate::evaluation::RouteCost;
use crate::network::RoutingNetwork;

use super::{Move, IMPROVEMENT_EPS};

/// Applies inter-route relocate improvement.
///
/// `routes` must be aligned with `network.fleet()`. Returns the improved
/// routes and their total cost.
///
/// # Examples
///
/// ```
/// use u_fleet::evaluation::{PriorityCost, RouteCost};
/// use u_fleet::local_search::relocate_improve;
/// use u_fleet::models::{DemandRequest, Location, Vehicle};
/// use u_fleet::network::NetworkBuilder;
///
/// let depot = Location::depot("dc", 0.0, 0.0).unwrap();
/// let demands = vec![
///     DemandRequest::new(Location::demand_node("east", 0.0, 0.1).unwrap(), 10, 0.5).unwrap(),
///     DemandRequest::new(Location::demand_node("west", 0.0, -0.1).unwrap(), 10, 0.5).unwrap(),
/// ];
/// let network = NetworkBuilder::haversine()
///     .build(&depot, &demands, &[Vehicle::new(0, 20), Vehicle::new(1, 20)])
///     .unwrap();
/// let cost = PriorityCost::new(network.distances(), network.priorities(), 1.0, 0.5);
///
/// let initial = vec![vec![1, 2], vec![]];
/// let (improved, c) = relocate_improve(&initial, &network, &cost);
/// assert!(c <= cost.total_cost(&initial));
/// assert_eq!(improved.concat().len(), 2);
/// ```
pub fn relocate_improve<C: RouteCost>(
    routes: &[Vec<usize>],
    network: &RoutingNetwork,
    cost: &C,
) -> (Vec<Vec<usize>>, f64) {
    let mut current = routes.to_vec();
    let mut improved = true;
    while improved {
        improved = false;
        for from_route in 0..current.len() {
            if let Some(mv) = first_relocate(&current, from_route, network, cost) {
                mv.apply(&mut current);
                improved = true;
            }
        }
    }
    let c = cost.total_cost(&current);
    (current, c)
}

/// Finds the first improving relocation of a stop out of `from_route`.
pub(crate) fn first_relocate<C: RouteCost>(
    routes: &[Vec<usize>],
    from_route: usize,
    network: &RoutingNetwork,
    cost: &C,
) -> Option<Move> {
    let source = &routes[from_route];
    if source.is_empty() {
        return None;
    }
    let demands = network.demands();
    let fleet = network.fleet();
    let source_cost = cost.route_cost(source);
    let mut shrunk = Vec::with_capacity(source.len());
    let mut grown = Vec::new();

    for from_pos in 0..source.len() {
        let node = source[from_pos];
        shrunk.clear();
        shrunk.extend_from_slice(&source[..from_pos]);
        shrunk.extend_from_slice(&source[from_pos + 1..]);
        let removal_gain = source_cost - cost.route_cost(&shrunk);

        for (to_route, target) in routes.iter().enumerate() {
            if to_route == from_route {
                continue;
            }
            let load: u32 = target.iter().map(|&c| demands[c]).sum();
            if load.saturating_add(demands[node]) > fleet[to_route].capacity() {
                continue;
            }
            let target_cost = cost.route_cost(target);

            for to_pos in 0..=target.len() {
                grown.clear();
                grown.extend_from_slice(&target[..to_pos]);
                grown.push(node);
                grown.extend_from_slice(&target[to_pos..]);
                let insertion = cost.route_cost(&grown) - target_cost;
                if insertion - removal_gain < -IMPROVEMENT_EPS {
                    return Some(Move::Relocate {
                        from_route,
                        from_pos,
                        to_route,
                        to_pos,
                    });
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::PriorityCost;
    use crate::models::{DemandRequest, Location, Vehicle};
    use crate::network::NetworkBuilder;

    fn network(points: &[(f64, f64, u32)], capacities: &[u32]) -> RoutingNetwork {
        let depot = Location::depot("dc", 0.0, 0.0).expect("valid");
        let demands: Vec<DemandRequest> = points
            .iter()
            .enumerate()
            .map(|(i, &(lat, lon, q))| {
                let loc = Location::demand_node(format!("n{}", i + 1), lat, lon).expect("valid");
                DemandRequest::new(loc, q, 0.5).expect("valid")
            })
            .collect();
        let fleet: Vec<Vehicle> = capacities
            .iter()
            .enumerate()
            .map(|(i, &c)| Vehicle::new(i, c))
            .collect();
        NetworkBuilder::haversine()
            .build(&depot, &demands, &fleet)
            .expect("valid")
    }

    #[test]
    fn test_relocate_merges_neighbours() {
        // n1 and n2 sit close together east; n3 is far north.
        let net = network(
            &[(0.0, 0.10, 5), (0.0, 0.11, 5), (0.5, 0.0, 5)],
            &[20, 20],
        );
        let cost = PriorityCost::new(net.distances(), net.priorities(), 1.0, 0.5);
        let initial = vec![vec![1, 3], vec![2]];
        let (improved, c) = relocate_improve(&initial, &net, &cost);
        assert!(c < cost.total_cost(&initial));
        let with_n1 = improved.iter().find(|r| r.contains(&1)).expect("n1 served");
        assert!(with_n1.contains(&2));
    }

    #[test]
    fn test_relocate_respects_capacity() {
        let net = network(&[(0.0, 0.10, 15), (0.0, 0.11, 15)], &[20, 20]);
        let cost = PriorityCost::new(net.distances(), net.priorities(), 1.0, 0.5);
        let initial = vec![vec![1], vec![2]];
        assert!(first_relocate(&initial, 0, &net, &cost).is_none());
        assert!(first_relocate(&initial, 1, &net, &cost).is_none());
    }

    #[test]
    fn test_relocate_empty_source() {
        let net = network(&[(0.0, 0.10, 5)], &[20, 20]);
        let cost = PriorityCost::new(net.distances(), net.priorities(), 1.0, 0.5);
        assert!(first_relocate(&[vec![], vec![1]], 0, &net, &cost).is_none());
    }

    #[test]
    fn test_relocate_does_not_worsen() {
        let net = network(
            &[(0.1, 0.1, 5), (-0.1, 0.1, 5), (0.1, -0.1, 5), (-0.1, -0.1, 5)],
            &[10, 10, 10],
        );
        let cost = PriorityCost::new(net.distances(), net.priorities(), 1.0, 0.5);
        let initial = vec![vec![1, 4], vec![2, 3], vec![]];
        let (improved, c) = relocate_improve(&initial, &net, &cost);
        assert!(c <= cost.total_cost(&initial) + 1e-10);
        let mut served = improved.concat();
        served.sort_unstable();
        assert_eq!(served, vec![1, 2, 3, 4]);
    }
}
