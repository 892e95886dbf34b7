//! Per-vehicle tracking state.

use chrono::{DateTime, Utc};

use crate::config::MonitorConfig;
use crate::models::{Location, VehiclePosition};
use crate::store::StoredPlan;

use super::{Backoff, VehicleState};

/// Everything the monitor knows about one vehicle.
#[derive(Debug, Clone)]
pub(crate) struct VehicleTrack {
    vehicle_id: usize,
    state: VehicleState,
    /// Timestamp of the last accepted update. Survives route completion so
    /// late duplicates are still rejected.
    last_accepted: Option<DateTime<Utc>>,
    position: Option<VehiclePosition>,
    /// Revision of the plan the waypoints came from (0 = none).
    plan_revision: u64,
    waypoints: Vec<Location>,
    next_waypoint: usize,
    backoff: Backoff,
}

impl VehicleTrack {
    pub(crate) fn new(vehicle_id: usize, config: &MonitorConfig) -> Self {
        Self {
            vehicle_id,
            state: VehicleState::Idle,
            last_accepted: None,
            position: None,
            plan_revision: 0,
            waypoints: Vec::new(),
            next_waypoint: 0,
            backoff: Backoff::new(config.backoff_base(), config.backoff_max()),
        }
    }

    pub(crate) fn state(&self) -> VehicleState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: VehicleState) {
        self.state = state;
    }

    pub(crate) fn position(&self) -> Option<VehiclePosition> {
        self.position
    }

    pub(crate) fn last_accepted(&self) -> Option<DateTime<Utc>> {
        self.last_accepted
    }

    pub(crate) fn plan_revision(&self) -> u64 {
        self.plan_revision
    }

    pub(crate) fn backoff_mut(&mut self) -> &mut Backoff {
        &mut self.backoff
    }

    pub(crate) fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Caches an accepted observation.
    pub(crate) fn accept(&mut self, position: VehiclePosition) {
        self.last_accepted = Some(position.observed_at);
        self.position = Some(position);
    }

    /// Takes the waypoints of this vehicle's route in `plan`, or goes idle
    /// if the plan has no route for it. Does nothing if already synced.
    pub(crate) fn sync_plan(&mut self, plan: Option<&StoredPlan>) {
        let revision = plan.map_or(0, |p| p.revision);
        if revision == self.plan_revision {
            return;
        }
        self.plan_revision = revision;
        self.next_waypoint = 0;
        self.waypoints = plan
            .and_then(|p| p.plan.route_for(self.vehicle_id))
            .map(|r| r.waypoints())
            .unwrap_or_default();
        self.state = if self.waypoints.is_empty() {
            VehicleState::Idle
        } else {
            VehicleState::EnRoute
        };
    }

    /// The waypoint the vehicle should be heading to.
    pub(crate) fn next_waypoint(&self) -> Option<&Location> {
        self.waypoints.get(self.next_waypoint)
    }

    /// Marks the next waypoint visited. Returns `true` when that was the
    /// last one, in which case the route and cached position are cleared
    /// and the vehicle goes idle.
    pub(crate) fn advance(&mut self) -> bool {
        self.next_waypoint += 1;
        if self.next_waypoint < self.waypoints.len() {
            return false;
        }
        self.waypoints.clear();
        self.next_waypoint = 0;
        self.position = None;
        self.state = VehicleState::Idle;
        true
    }
}
