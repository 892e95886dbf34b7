//! Route costing and feasibility checking.
//!
//! - [`PriorityCost`] — the priority-weighted arc cost the solver minimizes
//! - [`RouteEvaluator`] — builds [`Route`](crate::models::Route)s with legs, timing, and load
//! - [`validate_plan`] — capacity and exactly-once coverage checks

mod cost;
mod evaluator;

pub use cost::{route_distance, PriorityCost, RouteCost};
pub use evaluator::{validate_plan, RouteEvaluator, Violation, ViolationType};
