//! Domain model types for priority-weighted delivery routing.
//!
//! Provides the core abstractions: geographic locations, demand requests
//! with urgency scores, vehicles with capacity constraints, routes as
//! ordered legs, immutable route plans, and live vehicle positions.

mod demand;
mod location;
mod plan;
mod position;
mod route;
mod vehicle;

pub use demand::DemandRequest;
pub use location::{GeoPoint, Location, LocationRole};
pub use plan::{DropReason, DroppedDemand, PlanMetrics, RoutePlan, SearchStatus};
pub use position::{DeviationEvent, VehiclePosition};
pub use route::{Route, RouteLeg};
pub use vehicle::Vehicle;
