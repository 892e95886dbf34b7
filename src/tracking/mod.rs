//! Live vehicle tracking and deviation detection.
//!
//! [`TrackingMonitor`] ingests GPS updates per vehicle, compares each one
//! against the vehicle's next waypoint in the current route plan, and
//! publishes [`TrackingEvent`]s to per-vehicle [`Subscription`]s.

mod backoff;
mod event;
mod monitor;
pub mod simulate;
mod state;
mod subscription;

pub use backoff::Backoff;
pub use event::{SkipReason, TrackStatus, TrackingEvent, VehicleState};
pub use monitor::{PositionReport, TrackingMonitor};
pub use subscription::Subscription;
