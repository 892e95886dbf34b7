//! Network model construction.
//!
//! - [`NetworkBuilder`] — aggregates demand and fills the distance matrix
//! - [`RoutingNetwork`] — the index-aligned graph the solver consumes

mod builder;

pub use builder::{NetworkBuilder, RoutingNetwork};
