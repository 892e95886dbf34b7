//! Priority-weighted arc costs.
//!
//! # Cost model
//!
//! The cost of the arc into node `j`, when `j` is the `k`-th stop of its
//! route (0-based), is
//!
//! ```text
//! c(i, j, k) = d(i, j) - α · p(j) · γ^k
//! ```
//!
//! where `p(j)` is the urgency of `j` (0 for the depot) and `γ` is the
//! per-stop decay. Each served node is the head of exactly one arc, so with
//! `γ = 1` the urgency reward is the same for every ordering of a closed
//! tour; `γ < 1` rewards reaching urgent nodes early.
//!
//! α is clamped so that `α · max(p) < min(d > 0)`, which keeps every arc
//! between distinct points positive.

use tracing::warn;

use crate::distance::DistanceMatrix;

/// Fraction of the theoretical α bound that is actually used.
const ALPHA_BOUND_MARGIN: f64 = 0.99;

/// Anything that can price a single route given as node indices (depot
/// excluded at both ends).
pub trait RouteCost {
    fn route_cost(&self, route: &[usize]) -> f64;

    /// Sum over several routes.
    fn total_cost(&self, routes: &[Vec<usize>]) -> f64 {
        routes.iter().map(|r| self.route_cost(r)).sum()
    }
}

/// Distance minus decayed urgency reward.
///
/// # Examples
///
/// ```
/// use u_fleet::distance::DistanceMatrix;
/// use u_fleet::evaluation::{PriorityCost, RouteCost};
///
/// let dm = DistanceMatrix::from_data(3, vec![
///     0.0, 10.0, 20.0,
///     10.0, 0.0, 10.0,
///     20.0, 10.0, 0.0,
/// ]).unwrap();
/// let priorities = [0.0, 0.9, 0.1];
/// let cost = PriorityCost::new(&dm, &priorities, 1.0, 0.5);
///
/// // Visiting the urgent node first is cheaper.
/// assert!(cost.route_cost(&[1, 2]) < cost.route_cost(&[2, 1]));
/// ```
#[derive(Debug, Clone)]
pub struct PriorityCost<'a> {
    distances: &'a DistanceMatrix,
    priorities: &'a [f64],
    alpha: f64,
    decay_powers: Vec<f64>,
}

impl<'a> PriorityCost<'a> {
    /// Creates the cost model, clamping `alpha` to the stability bound.
    pub fn new(distances: &'a DistanceMatrix, priorities: &'a [f64], alpha: f64, decay: f64) -> Self {
        let requested = alpha;
        let alpha = match alpha_bound(distances, priorities) {
            Some(bound) if alpha > bound => {
                warn!(requested, effective = bound, "urgency weight clamped");
                bound
            }
            _ => alpha,
        };

        let n = distances.size();
        let mut decay_powers = Vec::with_capacity(n);
        let mut w = 1.0;
        for _ in 0..n.max(1) {
            decay_powers.push(w);
            w *= decay;
        }

        Self {
            distances,
            priorities,
            alpha,
            decay_powers,
        }
    }

    /// The α actually in use after clamping.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Cost of the arc `from → to` when `to` is stop number `stop_index`.
    /// Arcs into the depot (index 0) carry no reward.
    pub fn arc(&self, from: usize, to: usize, stop_index: usize) -> f64 {
        let d = self.distances.get(from, to);
        if to == 0 {
            return d;
        }
        let w = self
            .decay_powers
            .get(stop_index)
            .copied()
            .unwrap_or(0.0);
        d - self.alpha * self.priorities[to] * w
    }

    pub fn distances(&self) -> &DistanceMatrix {
        self.distances
    }
}

impl RouteCost for PriorityCost<'_> {
    fn route_cost(&self, route: &[usize]) -> f64 {
        if route.is_empty() {
            return 0.0;
        }
        let mut cost = 0.0;
        let mut prev = 0;
        for (k, &node) in route.iter().enumerate() {
            cost += self.arc(prev, node, k);
            prev = node;
        }
        cost + self.arc(prev, 0, route.len())
    }
}

/// Plain distance: `depot → route[0] → ... → route[n-1] → depot`.
pub fn route_distance(route: &[usize], distances: &DistanceMatrix) -> f64 {
    if route.is_empty() {
        return 0.0;
    }
    let mut dist = distances.get(0, route[0]);
    for w in route.windows(2) {
        dist += distances.get(w[0], w[1]);
    }
    dist + distances.get(route[route.len() - 1], 0)
}

/// Largest α that keeps `α · max(p) < min(d > 0)`, or `None` when no node
/// has positive urgency or no positive distance exists.
fn alpha_bound(distances: &DistanceMatrix, priorities: &[f64]) -> Option<f64> {
    let max_p = priorities.iter().copied().fold(0.0_f64, f64::max);
    if max_p <= 0.0 {
        return None;
    }
    distances
        .min_positive()
        .map(|min_d| ALPHA_BOUND_MARGIN * min_d / max_p)
}
