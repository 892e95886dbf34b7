//! # u-fleet
//!
//! Priority-weighted capacitated vehicle routing with live route tracking.
//! Plans delivery routes that serve urgent locations early, publishes them
//! through an atomic plan store, and watches vehicles for deviations.
//!
//! ## Modules
//!
//! - [`models`] — Domain types (Location, DemandRequest, Vehicle, Route, RoutePlan)
//! - [`distance`] — Distance matrix and sync/async distance providers
//! - [`network`] — Aggregates demand into a routing graph
//! - [`evaluation`] — Priority-weighted cost model and plan validation
//! - [`constructive`] — Capacity admission and cheapest insertion
//! - [`local_search`] — 2-opt, Or-opt, relocate, and Guided Local Search
//! - [`solver`] — The end-to-end routing solver
//! - [`store`] — Versioned route plan store with retrying persistence
//! - [`tracking`] — Live position monitor and deviation events
//! - [`dispatch`] — Solve-and-publish on the blocking pool
//! - [`config`] / [`error`] / [`telemetry`] — Ambient configuration, errors, logging
//!
//! ## Example
//!
//! ```
//! use u_fleet::config::RoutingConfig;
//! use u_fleet::models::{DemandRequest, Location, Vehicle};
//! use u_fleet::network::NetworkBuilder;
//! use u_fleet::solver::RoutingSolver;
//!
//! let depot = Location::depot("dc", 0.0, 0.0).unwrap();
//! let a = Location::demand_node("A", 0.0, 1.0).unwrap();
//! let b = Location::demand_node("B", 0.0, 2.0).unwrap();
//! let demands = vec![
//!     DemandRequest::new(a, 50, 0.9).unwrap(),
//!     DemandRequest::new(b, 50, 0.1).unwrap(),
//! ];
//!
//! let network = NetworkBuilder::haversine()
//!     .build(&depot, &demands, &[Vehicle::new(0, 100)])
//!     .unwrap();
//! let plan = RoutingSolver::new(RoutingConfig::default().with_max_iterations(100))
//!     .solve(&network)
//!     .unwrap();
//!
//! assert_eq!(plan.routes()[0].stop_ids(), vec!["A", "B"]);
//! ```

pub mod config;
pub mod constructive;
pub mod dispatch;
pub mod distance;
pub mod error;
pub mod evaluation;
pub mod local_search;
pub mod models;
pub mod network;
pub mod solver;
pub mod store;
pub mod telemetry;
pub mod tracking;
