//! Tracking states, check results, and subscriber events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{DeviationEvent, Location, VehiclePosition};

/// Per-vehicle tracking state.
///
/// ```text
/// Idle ──plan assigned──▶ EnRoute ──position──▶ OnTrack ⇄ Deviated
///   ▲                                              │
///   └──────── route completed / plan superseded ───┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleState {
    /// No route in the active plan.
    Idle,
    /// Route assigned, no position classified yet.
    EnRoute,
    OnTrack,
    Deviated,
}

/// Why a position update was accepted without a deviation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The vehicle has no route to compare against.
    Idle,
    /// The distance provider failed recently; checks are paused.
    Backoff,
    /// The distance provider failed or timed out on this update.
    ProviderFailure,
    /// A newer update or plan arrived while this check was in flight.
    Superseded,
}

/// Outcome of one accepted position update.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackStatus {
    /// Within the deviation threshold of the next waypoint.
    OnTrack { off_route_m: f64 },
    /// Beyond the threshold.
    Deviated(DeviationEvent),
    /// Accepted and cached, but not checked.
    Unchecked(SkipReason),
}

impl TrackStatus {
    pub fn is_deviated(&self) -> bool {
        matches!(self, TrackStatus::Deviated(_))
    }
}

/// An item on a vehicle's event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackingEvent {
    /// An accepted position and the state it left the vehicle in.
    Position {
        position: VehiclePosition,
        state: VehicleState,
    },
    Deviation(DeviationEvent),
    /// The vehicle came within the arrival radius of a waypoint.
    WaypointReached {
        vehicle_id: usize,
        waypoint: Location,
        observed_at: DateTime<Utc>,
    },
    /// The final depot waypoint was reached.
    RouteCompleted {
        vehicle_id: usize,
        observed_at: DateTime<Utc>,
    },
    /// The subscriber fell behind and `missed` events were discarded.
    Gap { missed: u64 },
}
