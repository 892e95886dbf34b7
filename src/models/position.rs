//! Live vehicle observations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GeoPoint, Location};

/// The most recent accepted position of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehiclePosition {
    pub vehicle_id: usize,
    pub point: GeoPoint,
    pub observed_at: DateTime<Utc>,
}

/// A vehicle observed too far from the waypoint it should be heading to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationEvent {
    pub vehicle_id: usize,
    /// Where the vehicle was seen.
    pub observed: GeoPoint,
    /// The next unvisited waypoint of its route.
    pub expected: Location,
    /// Distance between the two, in metres.
    pub off_route_m: f64,
    pub observed_at: DateTime<Utc>,
}
