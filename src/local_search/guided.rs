//! Guided local search over the 2-opt, Or-opt and relocate neighborhoods.
//!
//! # Algorithm
//!
//! 1. Descend to a local optimum of the true cost.
//! 2. Repeat until a stop condition holds:
//!    - penalize every edge of the current solution with maximal utility
//!      `d(i, j) / (1 + penalty(i, j))`
//!    - descend again under the augmented cost
//!      `cost + λ · Σ penalty(edge)`, with `λ = coefficient · cost / edges`
//!      taken from the first local optimum
//!    - keep the solution if its true cost beats the best so far
//!
//! Descent is first-improvement. The order in which routes are scanned is
//! reshuffled before each step from a seeded [`StdRng`], so a fixed seed
//! reproduces the same search when no deadline interrupts it.
//!
//! # Stop conditions
//!
//! - deadline passed → [`SearchStatus::TimeBudgetExhausted`]
//! - `stall_limit` rounds without a new best → [`SearchStatus::Converged`]
//! - `max_rounds` rounds → [`SearchStatus::IterationLimit`]
//!
//! # Reference
//!
//! Voudouris, C. & Tsang, E. (1999). "Guided local search and its
//! application to the traveling salesman problem", *European Journal of
//! Operational Research* 113(2), 469-499.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::trace;

use crate::distance::DistanceMatrix;
use crate::evaluation::RouteCost;
use crate::models::SearchStatus;
use crate::network::RoutingNetwork;

use super::or_opt::first_or_opt;
use super::relocate::first_relocate;
use super::two_opt::first_two_opt;
use super::IMPROVEMENT_EPS;

/// Symmetric per-edge penalty counters.
#[derive(Debug, Clone)]
pub struct EdgePenalties {
    size: usize,
    counts: Vec<u32>,
}

impl EdgePenalties {
    /// Creates zeroed penalties for `size` nodes.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            counts: vec![0; size * size],
        }
    }

    pub fn get(&self, i: usize, j: usize) -> u32 {
        self.counts[i * self.size + j]
    }

    fn bump(&mut self, i: usize, j: usize) {
        self.counts[i * self.size + j] += 1;
        if i != j {
            self.counts[j * self.size + i] += 1;
        }
    }

    /// Sum of penalties over the edges of one route, depot arcs included.
    pub fn route_penalty(&self, route: &[usize]) -> u64 {
        route_edges(route).map(|(i, j)| u64::from(self.get(i, j))).sum()
    }
}

/// A cost model plus `λ` times the penalties of the edges used.
pub struct AugmentedCost<'a, C> {
    base: &'a C,
    penalties: &'a EdgePenalties,
    lambda: f64,
}

impl<'a, C: RouteCost> AugmentedCost<'a, C> {
    pub fn new(base: &'a C, penalties: &'a EdgePenalties, lambda: f64) -> Self {
        Self {
            base,
            penalties,
            lambda,
        }
    }
}

impl<C: RouteCost> RouteCost for AugmentedCost<'_, C> {
    fn route_cost(&self, route: &[usize]) -> f64 {
        self.base.route_cost(route) + self.lambda * self.penalties.route_penalty(route) as f64
    }
}

/// Best solution found by a search run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Node sequences aligned with the fleet.
    pub routes: Vec<Vec<usize>>,
    /// True cost of `routes`.
    pub cost: f64,
    pub status: SearchStatus,
    /// Penalty rounds performed after the first local optimum.
    pub rounds: usize,
}

/// Guided local search driver.
///
/// # Examples
///
/// ```
/// use u_fleet::evaluation::{PriorityCost, RouteCost};
/// use u_fleet::local_search::GuidedLocalSearch;
/// use u_fleet::models::{DemandRequest, Location, SearchStatus, Vehicle};
/// use u_fleet::network::NetworkBuilder;
///
/// let depot = Location::depot("dc", 0.0, 0.0).unwrap();
/// let demands: Vec<_> = [(0.1, 0.0), (0.1, 0.1), (0.0, 0.1), (-0.1, 0.1)]
///     .iter()
///     .enumerate()
///     .map(|(i, &(lat, lon))| {
///         let loc = Location::demand_node(format!("s{i}"), lat, lon).unwrap();
///         DemandRequest::new(loc, 10, 0.5).unwrap()
///     })
///     .collect();
/// let network = NetworkBuilder::haversine()
///     .build(&depot, &demands, &[Vehicle::new(0, 40)])
///     .unwrap();
/// let cost = PriorityCost::new(network.distances(), network.priorities(), 1.0, 0.5);
///
/// let initial = vec![vec![3, 1, 4, 2]];
/// let outcome = GuidedLocalSearch::new(&network, &cost)
///     .with_max_rounds(20)
///     .run(initial.clone());
/// assert!(outcome.cost <= cost.total_cost(&initial));
/// assert_ne!(outcome.status, SearchStatus::TimeBudgetExhausted);
/// ```
pub struct GuidedLocalSearch<'a, C> {
    network: &'a RoutingNetwork,
    cost: &'a C,
    lambda_coefficient: f64,
    seed: u64,
    max_rounds: Option<usize>,
    stall_limit: usize,
    deadline: Option<Instant>,
}

impl<'a, C: RouteCost> GuidedLocalSearch<'a, C> {
    /// Creates a search with λ coefficient 0.1, seed 42, stall limit 100,
    /// no round cap and no deadline.
    pub fn new(network: &'a RoutingNetwork, cost: &'a C) -> Self {
        Self {
            network,
            cost,
            lambda_coefficient: 0.1,
            seed: 42,
            max_rounds: None,
            stall_limit: 100,
            deadline: None,
        }
    }

    pub fn with_lambda(mut self, coefficient: f64) -> Self {
        self.lambda_coefficient = coefficient;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    pub fn with_stall_limit(mut self, rounds: usize) -> Self {
        self.stall_limit = rounds;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Runs the search from `initial` (one sequence per vehicle).
    pub fn run(&self, initial: Vec<Vec<usize>>) -> SearchOutcome {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut current = initial;

        let finished = self.descend(&mut current, self.cost, &mut rng);
        let mut best = current.clone();
        let mut best_cost = self.cost.total_cost(&best);
        if !finished {
            return SearchOutcome {
                routes: best,
                cost: best_cost,
                status: SearchStatus::TimeBudgetExhausted,
                rounds: 0,
            };
        }

        let edges = edge_count(&current);
        if edges == 0 {
            return SearchOutcome {
                routes: best,
                cost: best_cost,
                status: SearchStatus::Converged,
                rounds: 0,
            };
        }
        let lambda = self.lambda_coefficient * best_cost.abs() / edges as f64;
        let mut penalties = EdgePenalties::new(self.network.nodes().len());
        let mut rounds = 0;
        let mut stall = 0;

        let status = loop {
            if self.expired() {
                break SearchStatus::TimeBudgetExhausted;
            }
            if stall >= self.stall_limit {
                break SearchStatus::Converged;
            }
            if self.max_rounds.is_some_and(|m| rounds >= m) {
                break SearchStatus::IterationLimit;
            }

            penalize(&current, self.network.distances(), &mut penalties);
            let augmented = AugmentedCost::new(self.cost, &penalties, lambda);
            let finished = self.descend(&mut current, &augmented, &mut rng);
            rounds += 1;

            let c = self.cost.total_cost(&current);
            if c < best_cost - IMPROVEMENT_EPS {
                trace!(round = rounds, cost = c, "new best solution");
                best.clone_from(&current);
                best_cost = c;
                stall = 0;
            } else {
                stall += 1;
            }

            if !finished {
                break SearchStatus::TimeBudgetExhausted;
            }
        };

        SearchOutcome {
            routes: best,
            cost: best_cost,
            status,
            rounds,
        }
    }

    /// First-improvement descent. Returns `false` if the deadline cut it
    /// short.
    fn descend<K: RouteCost>(&self, routes: &mut [Vec<usize>], cost: &K, rng: &mut StdRng) -> bool {
        let mut order: Vec<usize> = (0..routes.len()).collect();
        loop {
            if self.expired() {
                return false;
            }
            order.shuffle(rng);
            let view: &[Vec<usize>] = routes;
            let found = order.iter().find_map(|&ri| {
                first_two_opt(ri, &view[ri], cost)
                    .or_else(|| first_or_opt(ri, &view[ri], cost))
                    .or_else(|| first_relocate(view, ri, self.network, cost))
            });
            match found {
                Some(mv) => mv.apply(routes),
                None => return true,
            }
        }
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Penalizes the maximal-utility edges of `routes`. Returns how many edges
/// were penalized.
fn penalize(routes: &[Vec<usize>], distances: &DistanceMatrix, penalties: &mut EdgePenalties) -> usize {
    let utility = |i: usize, j: usize| distances.get(i, j) / (1.0 + f64::from(penalties.get(i, j)));

    let max_utility = routes
        .iter()
        .flat_map(|r| route_edges(r))
        .map(|(i, j)| utility(i, j))
        .fold(f64::NEG_INFINITY, f64::max);

    let chosen: Vec<(usize, usize)> = routes
        .iter()
        .flat_map(|r| route_edges(r))
        .filter(|&(i, j)| utility(i, j) >= max_utility - 1e-12)
        .collect();

    for &(i, j) in &chosen {
        penalties.bump(i, j);
    }
    chosen.len()
}

/// Edges of a route including the depot arcs; nothing for an empty route.
fn route_edges(route: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    let first = route.first().map(|&n| (0, n));
    let last = route.last().map(|&n| (n, 0));
    first
        .into_iter()
        .chain(route.windows(2).map(|w| (w[0], w[1])))
        .chain(last)
}

fn edge_count(routes: &[Vec<usize>]) -> usize {
    routes
        .iter()
        .filter(|r| !r.is_empty())
        .map(|r| r.len() + 1)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::PriorityCost;
    use crate::models::{DemandRequest, Location, Vehicle};
    use crate::network::NetworkBuilder;

    fn grid_network(capacities: &[u32]) -> RoutingNetwork {
        let depot = Location::depot("dc", 0.0, 0.0).expect("valid");
        let mut demands = Vec::new();
        let mut k = 0;
        for x in -2..=2 {
            for y in -1..=1 {
                if x == 0 && y == 0 {
                    continue;
                }
                k += 1;
                let loc = Location::demand_node(format!("g{k}"), 0.05 * y as f64, 0.05 * x as f64)
                    .expect("valid");
                let urgency = (k % 5) as f64 / 5.0;
                demands.push(DemandRequest::new(loc, 5, urgency).expect("valid"));
            }
        }
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
    fn test_route_edges() {
        let edges: Vec<_> = route_edges(&[3, 1, 2]).collect();
        assert_eq!(edges, vec![(0, 3), (3, 1), (1, 2), (2, 0)]);
        assert_eq!(route_edges(&[]).count(), 0);
        assert_eq!(edge_count(&[vec![1, 2], vec![], vec![3]]), 5);
    }

    #[test]
    fn test_penalize_picks_longest_edge() {
        let mut dm = DistanceMatrix::new(3);
        for (i, j, d) in [(0, 1, 1.0), (1, 2, 5.0), (0, 2, 2.0)] {
            dm.set(i, j, d);
            dm.set(j, i, d);
        }
        let mut pen = EdgePenalties::new(3);
        let routes = vec![vec![1, 2]];
        assert_eq!(penalize(&routes, &dm, &mut pen), 1);
        assert_eq!(pen.get(1, 2), 1);
        assert_eq!(pen.get(2, 1), 1);
        assert_eq!(pen.route_penalty(&[1, 2]), 1);
        // 5 / 2 = 2.5 still beats 2 / 1
        penalize(&routes, &dm, &mut pen);
        assert_eq!(pen.get(1, 2), 2);
        // 5 / 3 < 2 / 1 now
        penalize(&routes, &dm, &mut pen);
        assert_eq!(pen.get(2, 0), 1);
    }

    #[test]
    fn test_augmented_cost_adds_penalties() {
        let net = grid_network(&[100]);
        let cost = PriorityCost::new(net.distances(), net.priorities(), 1.0, 0.5);
        let mut pen = EdgePenalties::new(net.nodes().len());
        pen.bump(0, 1);
        let aug = AugmentedCost::new(&cost, &pen, 2.5);
        let diff = aug.route_cost(&[1, 2]) - cost.route_cost(&[1, 2]);
        assert!((diff - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_gls_improves_and_keeps_coverage() {
        let net = grid_network(&[40, 40, 40]);
        let cost = PriorityCost::new(net.distances(), net.priorities(), 1.0, 0.5);
        let initial = vec![(1..=7).collect(), (8..=14).collect(), vec![]];
        let outcome = GuidedLocalSearch::new(&net, &cost)
            .with_max_rounds(15)
            .run(initial.clone());
        assert!(outcome.cost <= cost.total_cost(&initial) + 1e-10);
        let mut served = outcome.routes.concat();
        served.sort_unstable();
        assert_eq!(served, (1..=14).collect::<Vec<_>>());
        for (vi, r) in outcome.routes.iter().enumerate() {
            let load: u32 = r.iter().map(|&n| net.demands()[n]).sum();
            assert!(load <= net.fleet()[vi].capacity());
        }
    }

    #[test]
    fn test_gls_deterministic_for_seed() {
        let net = grid_network(&[40, 40, 40]);
        let cost = PriorityCost::new(net.distances(), net.priorities(), 1.0, 0.5);
        let initial = vec![(1..=7).collect(), (8..=14).collect(), vec![]];
        let run = || {
            GuidedLocalSearch::new(&net, &cost)
                .with_seed(7)
                .with_max_rounds(10)
                .run(initial.clone())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_gls_status() {
        let net = grid_network(&[100]);
        let cost = PriorityCost::new(net.distances(), net.priorities(), 1.0, 0.5);
        let initial = vec![(1..=14).collect()];

        let capped = GuidedLocalSearch::new(&net, &cost)
            .with_max_rounds(3)
            .with_stall_limit(1000)
            .run(initial.clone());
        assert_eq!(capped.status, SearchStatus::IterationLimit);
        assert_eq!(capped.rounds, 3);

        let stalled = GuidedLocalSearch::new(&net, &cost)
            .with_stall_limit(0)
            .run(initial.clone());
        assert_eq!(stalled.status, SearchStatus::Converged);
        assert_eq!(stalled.rounds, 0);

        let expired = GuidedLocalSearch::new(&net, &cost)
            .with_deadline(Some(Instant::now()))
            .run(initial);
        assert_eq!(expired.status, SearchStatus::TimeBudgetExhausted);
    }

    #[test]
    fn test_gls_empty_routes() {
        let net = grid_network(&[100]);
        let cost = PriorityCost::new(net.distances(), net.priorities(), 1.0, 0.5);
        let outcome = GuidedLocalSearch::new(&net, &cost).run(vec![vec![]]);
        assert_eq!(outcome.status, SearchStatus::Converged);
        assert_eq!(outcome.cost, 0.0);
    }
}
