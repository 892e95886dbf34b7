//! Error taxonomy shared by the builder, solver, store, and monitor.
//!
//! - [`InputError`] — bad caller input, surfaced immediately
//! - [`ProviderError`] — external distance lookup failures
//! - [`SolveError`] — network construction and solving
//! - [`TrackingError`] — position ingestion
//! - [`StoreError`] — plan persistence
//! - [`DispatchError`] — the solve-and-save batch path

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{DroppedDemand, RoutePlan};

/// Invalid input detected before any work is done. Never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// A latitude or longitude is non-finite or out of range.
    #[error("invalid coordinate ({lat}, {lon}) for location `{id}`")]
    InvalidCoordinate { id: String, lat: f64, lon: f64 },

    /// No location with positive demand remains.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Urgency outside `[0, 1]`.
    #[error("urgency {urgency} for location `{id}` is outside [0, 1]")]
    InvalidUrgency { id: String, urgency: f64 },

    /// A vehicle with zero capacity.
    #[error("vehicle {id} has invalid capacity {capacity}")]
    InvalidVehicle { id: usize, capacity: u32 },

    /// The fleet roster is empty.
    #[error("fleet roster is empty")]
    EmptyFleet,

    /// A location is used with an unexpected role.
    #[error("location `{id}` has role {found:?}, expected {expected:?}")]
    InvalidRole {
        id: String,
        expected: crate::models::LocationRole,
        found: crate::models::LocationRole,
    },

    /// The same location id is used with two different coordinates.
    #[error("location `{0}` appears with conflicting coordinates")]
    ConflictingLocation(String),

    /// Requests at one location add up to more than a `u32` can hold.
    #[error("total quantity at location `{0}` overflows")]
    QuantityOverflow(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failure of an external distance or directions collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// The provider could not be reached.
    #[error("distance provider unavailable: {0}")]
    Unavailable(String),

    /// The provider did not answer in time.
    #[error("distance provider timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered with something unusable.
    #[error("distance provider returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors from building a routing network or solving it.
#[derive(Debug, Clone, Error)]
pub enum SolveError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// No vehicle can carry even the smallest demand.
    #[error("no feasible solution: {} demand node(s) cannot be served", dropped.len())]
    NoFeasibleSolution { dropped: Vec<DroppedDemand> },
}

/// Errors from the position ingestion boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
    #[error(transparent)]
    Input(#[from] InputError),

    /// Duplicate or out-of-order observation.
    #[error("stale update for vehicle {vehicle_id}: {received} is not after {last_accepted}")]
    StaleUpdate {
        vehicle_id: usize,
        last_accepted: DateTime<Utc>,
        received: DateTime<Utc>,
    },
}

/// Errors from persisting a route plan.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The persistence collaborator rejected the write.
    #[error("persistence failed: {0}")]
    Persist(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Every attempt failed. The plan is handed back so the caller can
    /// retry or discard it.
    #[error("save failed after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: String,
        plan: Arc<RoutePlan>,
    },
}

/// Errors from [`Dispatcher::dispatch`](crate::dispatch::Dispatcher::dispatch).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Solve(#[from] SolveError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("solver task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_messages() {
        let e = InputError::InvalidCoordinate {
            id: "A".into(),
            lat: 91.0,
            lon: 0.0,
        };
        assert_eq!(e.to_string(), "invalid coordinate (91, 0) for location `A`");
        assert_eq!(InputError::EmptyFleet.to_string(), "fleet roster is empty");
    }

    #[test]
    fn test_solve_error_from_input() {
        let e: SolveError = InputError::InsufficientData("no demand".into()).into();
        assert!(matches!(e, SolveError::Input(InputError::InsufficientData(_))));
        assert_eq!(e.to_string(), "insufficient data: no demand");
    }

    #[test]
    fn test_no_feasible_message_counts_drops() {
        let e = SolveError::NoFeasibleSolution { dropped: vec![] };
        assert_eq!(
            e.to_string(),
            "no feasible solution: 0 demand node(s) cannot be served"
        );
    }
}
