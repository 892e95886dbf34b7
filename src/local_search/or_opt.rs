//! Intra-route Or-opt improvement.
//!
//! # Algorithm
//!
//! Tries moving segments of 1, 2, or 3 consecutive stops to a different
//! position within the same route. Accepts the first move that reduces the
//! route cost.
//!
//! # Complexity
//!
//! O(n³) per pass (O(n²) candidates, each priced in O(n)).
//!
//! # Reference
//!
//! Or, I. (1976). "Traveling Salesman-Type Combinatorial Problems and Their
//! Relation to the Logistics of Blood Banking". PhD thesis.

use crate::evaluation::RouteCost;

use super::{Move, IMPROVEMENT_EPS};

/// Longest segment Or-opt will move.
const MAX_SEGMENT: usize = 3;

/// Applies Or-opt improvement to a single route.
///
/// Returns the improved node sequence and its cost.
///
/// # Examples
///
/// ```
/// use u_fleet::distance::DistanceMatrix;
/// use u_fleet::evaluation::{PriorityCost, RouteCost};
/// use u_fleet::local_search::or_opt_improve;
///
/// let mut dm = DistanceMatrix::new(4);
/// for i in 0..4 {
///     for j in 0..4 {
///         dm.set(i, j, (i as f64 - j as f64).abs());
///     }
/// }
/// let priorities = [0.0; 4];
/// let cost = PriorityCost::new(&dm, &priorities, 1.0, 0.5);
///
/// let (improved, c) = or_opt_improve(&[2, 3, 1], &cost);
/// assert!(c <= cost.route_cost(&[2, 3, 1]));
/// assert_eq!(improved.len(), 3);
/// ```
pub fn or_opt_improve<C: RouteCost>(route: &[usize], cost: &C) -> (Vec<usize>, f64) {
    let mut routes = vec![route.to_vec()];
    while let Some(mv) = first_or_opt(0, &routes[0], cost) {
        mv.apply(&mut routes);
    }
    let improved = routes.swap_remove(0);
    let c = cost.route_cost(&improved);
    (improved, c)
}

/// Finds the first improving Or-opt move in route `route_idx`.
pub(crate) fn first_or_opt<C: RouteCost>(
    route_idx: usize,
    route: &[usize],
    cost: &C,
) -> Option<Move> {
    let n = route.len();
    if n < 2 {
        return None;
    }
    let base = cost.route_cost(route);
    let mut rest = Vec::with_capacity(n);
    let mut trial = Vec::with_capacity(n);

    for len in 1..=MAX_SEGMENT.min(n - 1) {
        for from in 0..=n - len {
            rest.clear();
            rest.extend_from_slice(&route[..from]);
            rest.extend_from_slice(&route[from + len..]);
            let segment = &route[from..from + len];

            for to in 0..=rest.len() {
                if to == from {
                    continue;
                }
                trial.clear();
                trial.extend_from_slice(&rest[..to]);
                trial.extend_from_slice(segment);
                trial.extend_from_slice(&rest[to..]);
                if cost.route_cost(&trial) < base - IMPROVEMENT_EPS {
                    return Some(Move::OrOpt {
                        route: route_idx,
                        from,
                        len,
                        to,
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
    use crate::distance::DistanceMatrix;
    use crate::evaluation::PriorityCost;

    fn line(n: usize) -> DistanceMatrix {
        let mut dm = DistanceMatrix::new(n);
        for i in 0..n {
            for j in 0..n {
                dm.set(i, j, (i as f64 - j as f64).abs());
            }
        }
        dm
    }

    #[test]
    fn test_or_opt_fixes_misplaced_stop() {
        let dm = line(5);
        let p = [0.0; 5];
        let cost = PriorityCost::new(&dm, &p, 1.0, 0.5);
        // 0 -> 1 -> 4 -> 2 -> 3 -> 0 = 1 + 3 + 2 + 1 + 3 = 10
        let (improved, c) = or_opt_improve(&[1, 4, 2, 3], &cost);
        assert!((c - 8.0).abs() < 1e-10);
        assert_eq!(improved.len(), 4);
    }

    #[test]
    fn test_or_opt_moves_urgent_segment_forward() {
        let dm = line(4);
        let p = [0.0, 0.0, 0.0, 0.9];
        let cost = PriorityCost::new(&dm, &p, 0.5, 0.5);
        let before = cost.route_cost(&[1, 2, 3]);
        let (_, c) = or_opt_improve(&[1, 2, 3], &cost);
        assert!(c <= before);
    }

    #[test]
    fn test_or_opt_short_routes() {
        let dm = line(3);
        let p = [0.0; 3];
        let cost = PriorityCost::new(&dm, &p, 1.0, 0.5);
        assert!(first_or_opt(0, &[], &cost).is_none());
        assert!(first_or_opt(0, &[2], &cost).is_none());
        let (r, c) = or_opt_improve(&[2], &cost);
        assert_eq!(r, vec![2]);
        assert!((c - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_or_opt_move_is_valid() {
        let dm = line(5);
        let p = [0.0; 5];
        let cost = PriorityCost::new(&dm, &p, 1.0, 0.5);
        let route = vec![3, 1, 2, 4];
        if let Some(mv) = first_or_opt(0, &route, &cost) {
            let mut routes = vec![route.clone()];
            mv.apply(&mut routes);
            assert!(cost.route_cost(&routes[0]) < cost.route_cost(&route));
        }
    }
}
