//! Solve orchestration: admission, construction, guided local search and
//! plan extraction.
//!
//! - [`RoutingSolver`] — runs the full pipeline on a [`RoutingNetwork`](crate::network::RoutingNetwork)
//! - [`extract`] / [`plan_metrics`] — sequences to [`RoutePlan`](crate::models::RoutePlan)

mod engine;
mod extract;

pub use engine::RoutingSolver;
pub use extract::{extract, plan_metrics};
