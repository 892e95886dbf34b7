//! Intra-route 2-opt improvement.
//!
//! # Algorithm
//!
//! For each pair of positions (i, j) with i < j in a route, reverse the
//! segment `[i..=j]` and compare route costs. The cost is recomputed in full
//! rather than from the four affected arcs because the urgency reward of
//! every stop inside the segment depends on its position.
//!
//! If the reversed route is cheaper, accept it (first-improvement strategy)
//! and repeat until no further improvement is found.
//!
//! # Complexity
//!
//! O(n³) per pass.
//!
//! # Reference
//!
//! Croes, G.A. (1958). "A method for solving traveling salesman problems",
//! *Operations Research* 6(6), 791-812.

use crate::evaluation::RouteCost;

use super::{Move, IMPROVEMENT_EPS};

/// Applies 2-opt improvement to a single route.
///
/// Returns the improved node sequence and its cost.
///
/// # Arguments
///
/// * `route` — Ordered node indices (excluding depot)
/// * `cost` — Route cost model
///
/// # Examples
///
/// ```
/// use u_fleet::distance::DistanceMatrix;
/// use u_fleet::evaluation::{route_distance, PriorityCost};
/// use u_fleet::local_search::two_opt_improve;
///
/// // depot and three nodes on a line at 0, 1, 2, 3
/// let mut dm = DistanceMatrix::new(4);
/// for i in 0..4 {
///     for j in 0..4 {
///         dm.set(i, j, (i as f64 - j as f64).abs());
///     }
/// }
/// let priorities = [0.0; 4];
/// let cost = PriorityCost::new(&dm, &priorities, 1.0, 0.5);
///
/// let (improved, c) = two_opt_improve(&[1, 3, 2], &cost);
/// assert!((c - 6.0).abs() < 1e-10);
/// assert!((route_distance(&improved, &dm) - 6.0).abs() < 1e-10);
/// ```
pub fn two_opt_improve<C: RouteCost>(route: &[usize], cost: &C) -> (Vec<usize>, f64) {
    let mut routes = vec![route.to_vec()];
    while let Some(mv) = first_two_opt(0, &routes[0], cost) {
        mv.apply(&mut routes);
    }
    let improved = routes.swap_remove(0);
    let c = cost.route_cost(&improved);
    (improved, c)
}

/// Finds the first improving 2-opt move in route `route_idx`.
pub(crate) fn first_two_opt<C: RouteCost>(
    route_idx: usize,
    route: &[usize],
    cost: &C,
) -> Option<Move> {
    let n = route.len();
    if n < 2 {
        return None;
    }
    let base = cost.route_cost(route);
    let mut trial = route.to_vec();

    for i in 0..n - 1 {
        for j in i + 1..n {
            trial[i..=j].reverse();
            let c = cost.route_cost(&trial);
            trial[i..=j].reverse();
            if c < base - IMPROVEMENT_EPS {
                return Some(Move::TwoOpt {
                    route: route_idx,
                    i,
                    j,
                });
            }
        }
    }
    None
}
