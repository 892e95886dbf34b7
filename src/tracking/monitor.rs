//! The live tracking monitor.
//!
//! # Algorithm
//!
//! Each accepted position is compared with the next unvisited waypoint of
//! the vehicle's route in the current plan:
//!
//! 1. Reject the update if it is not newer than the last accepted one.
//! 2. Cache it and resync the vehicle with the current plan revision.
//! 3. Ask the distance provider, under a timeout and with no lock held.
//! 4. Discard the result if a newer update arrived meanwhile. Otherwise,
//!    beyond the deviation threshold the vehicle is `Deviated`, else
//!    `OnTrack`; within the arrival radius the waypoint is marked visited.
//!
//! A check that straddles a plan change still reports its outcome against
//! the waypoint it captured, but leaves the state and progress that the
//! new plan set up untouched.
//!
//! Provider failures skip the check and pause further checks with an
//! exponential backoff.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::distance::AsyncDistanceProvider;
use crate::error::{InputError, ProviderError, TrackingError};
use crate::models::{DeviationEvent, GeoPoint, Location, VehiclePosition};
use crate::store::StoredPlan;

use super::state::VehicleTrack;
use super::{SkipReason, Subscription, TrackStatus, TrackingEvent, VehicleState};

/// One raw GPS observation, as delivered by a position feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub lat: f64,
    pub lon: f64,
    pub observed_at: DateTime<Utc>,
}

struct Inner {
    config: MonitorConfig,
    provider: Arc<dyn AsyncDistanceProvider>,
    plans: watch::Receiver<Option<Arc<StoredPlan>>>,
    tracks: DashMap<usize, Arc<Mutex<VehicleTrack>>>,
    channels: DashMap<usize, broadcast::Sender<TrackingEvent>>,
    feeds: DashMap<usize, JoinHandle<()>>,
}

/// Tracks vehicle positions against the current route plan.
///
/// Cheap to clone; clones share all state. Updates for different vehicles
/// proceed in parallel.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chrono::Utc;
/// use tokio::sync::watch;
/// use u_fleet::config::MonitorConfig;
/// use u_fleet::distance::Haversine;
/// use u_fleet::tracking::{SkipReason, TrackStatus, TrackingMonitor};
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let (_tx, plans) = watch::channel(None);
/// let monitor = TrackingMonitor::new(MonitorConfig::default(), plans, Arc::new(Haversine)).unwrap();
///
/// // No plan yet, so the position is cached but not checked.
/// let status = monitor.report_position(0, 33.75, -84.39, Utc::now()).await.unwrap();
/// assert_eq!(status, TrackStatus::Unchecked(SkipReason::Idle));
/// assert!(monitor.position(0).is_some());
/// # });
/// ```
#[derive(Clone)]
pub struct TrackingMonitor {
    inner: Arc<Inner>,
}

impl TrackingMonitor {
    /// Creates a monitor reading plans from `plans`.
    ///
    /// # Errors
    ///
    /// [`InputError::InvalidConfig`] if `config` fails validation.
    pub fn new(
        config: MonitorConfig,
        plans: watch::Receiver<Option<Arc<StoredPlan>>>,
        provider: Arc<dyn AsyncDistanceProvider>,
    ) -> Result<Self, InputError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                provider,
                plans,
                tracks: DashMap::new(),
                channels: DashMap::new(),
                feeds: DashMap::new(),
            }),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// Ingests one position update.
    ///
    /// The position is cached as soon as it is accepted, whether or not the
    /// deviation check then runs.
    ///
    /// # Errors
    ///
    /// - [`TrackingError::Input`] for out-of-range coordinates.
    /// - [`TrackingError::StaleUpdate`] if `observed_at` is not after the
    ///   last accepted update of this vehicle. Nothing is changed.
    pub async fn report_position(
        &self,
        vehicle_id: usize,
        lat: f64,
        lon: f64,
        observed_at: DateTime<Utc>,
    ) -> Result<TrackStatus, TrackingError> {
        let point = GeoPoint::new(lat, lon).map_err(|_| InputError::InvalidCoordinate {
            id: format!("vehicle {vehicle_id}"),
            lat,
            lon,
        })?;
        let position = VehiclePosition {
            vehicle_id,
            point,
            observed_at,
        };
        let entry = self.track(vehicle_id);
        let plan = self.inner.plans.borrow().clone();

        let (waypoint, revision) = {
            let mut track = entry.lock();
            if let Some(last_accepted) = track.last_accepted() {
                if observed_at <= last_accepted {
                    warn!(vehicle_id, %observed_at, %last_accepted, "stale position update rejected");
                    return Err(TrackingError::StaleUpdate {
                        vehicle_id,
                        last_accepted,
                        received: observed_at,
                    });
                }
            }
            track.accept(position);
            track.sync_plan(plan.as_deref());

            match track.next_waypoint().cloned() {
                Some(waypoint) if !track.backoff().is_active(Instant::now()) => {
                    (waypoint, track.plan_revision())
                }
                next => {
                    let reason = if next.is_some() {
                        SkipReason::Backoff
                    } else {
                        SkipReason::Idle
                    };
                    self.emit_position(&track, position);
                    return Ok(TrackStatus::Unchecked(reason));
                }
            }
        };

        let measured = self.measure(point, &waypoint).await;

        if !self.is_tracked(vehicle_id, &entry) {
            return Ok(TrackStatus::Unchecked(SkipReason::Superseded));
        }
        let mut track = entry.lock();
        if track.last_accepted() != Some(observed_at) {
            debug!(vehicle_id, %observed_at, "deviation check superseded");
            return Ok(TrackStatus::Unchecked(SkipReason::Superseded));
        }
        let same_plan = track.plan_revision() == revision;
        if !same_plan {
            debug!(
                vehicle_id,
                checked_revision = revision,
                current_revision = track.plan_revision(),
                "plan replaced during deviation check"
            );
        }

        let off_route_m = match measured {
            Ok(d) => {
                track.backoff_mut().reset();
                d
            }
            Err(e) => {
                let pause = track.backoff_mut().record_failure(Instant::now());
                warn!(
                    vehicle_id,
                    error = %e,
                    failures = track.backoff().failures(),
                    ?pause,
                    "distance provider failed; skipping deviation check"
                );
                self.emit_position(&track, position);
                return Ok(TrackStatus::Unchecked(SkipReason::ProviderFailure));
            }
        };

        if off_route_m > self.inner.config.deviation_threshold_m {
            if same_plan {
                track.set_state(VehicleState::Deviated);
            }
            let event = DeviationEvent {
                vehicle_id,
                observed: point,
                expected: waypoint,
                off_route_m,
                observed_at,
            };
            warn!(
                vehicle_id,
                off_route_m,
                expected = event.expected.id(),
                "vehicle deviated from route"
            );
            self.emit_position(&track, position);
            self.emit(vehicle_id, TrackingEvent::Deviation(event.clone()));
            return Ok(TrackStatus::Deviated(event));
        }

        if !same_plan {
            self.emit_position(&track, position);
            return Ok(TrackStatus::OnTrack { off_route_m });
        }
        track.set_state(VehicleState::OnTrack);
        if off_route_m > self.inner.config.arrival_radius_m {
            self.emit_position(&track, position);
            return Ok(TrackStatus::OnTrack { off_route_m });
        }

        let completed = track.advance();
        debug!(vehicle_id, waypoint = waypoint.id(), completed, "waypoint reached");
        self.emit_position(&track, position);
        self.emit(
            vehicle_id,
            TrackingEvent::WaypointReached {
                vehicle_id,
                waypoint,
                observed_at,
            },
        );
        if completed {
            info!(vehicle_id, %observed_at, "route completed");
            self.emit(
                vehicle_id,
                TrackingEvent::RouteCompleted {
                    vehicle_id,
                    observed_at,
                },
            );
        }
        Ok(TrackStatus::OnTrack { off_route_m })
    }

    /// Resyncs every tracked vehicle with `plan`. Vehicles that gain a
    /// route start out `EnRoute`, the rest become `Idle`.
    pub fn apply_plan(&self, plan: Option<&StoredPlan>) {
        if let Some(stored) = plan {
            for route in stored.plan.routes() {
                self.track(route.vehicle().id());
            }
        }
        for entry in self.inner.tracks.iter() {
            entry.value().lock().sync_plan(plan);
        }
        debug!(
            revision = plan.map_or(0, |p| p.revision),
            vehicles = self.inner.tracks.len(),
            "tracking synced to plan"
        );
    }

    /// Spawns a task that applies every plan published on the watch
    /// channel, starting with the current one. The task ends when the
    /// publisher is dropped.
    pub fn watch_plans(&self) -> JoinHandle<()> {
        let monitor = self.clone();
        let mut rx = self.inner.plans.clone();
        tokio::spawn(async move {
            loop {
                let plan = rx.borrow_and_update().clone();
                monitor.apply_plan(plan.as_deref());
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Subscribes to a vehicle's events from now on.
    pub fn subscribe(&self, vehicle_id: usize) -> Subscription {
        let buffer = self.inner.config.subscriber_buffer;
        let rx = self
            .inner
            .channels
            .entry(vehicle_id)
            .or_insert_with(|| broadcast::channel(buffer).0)
            .subscribe();
        Subscription::new(vehicle_id, rx)
    }

    /// Starts ingesting `reports` for a vehicle in a background task,
    /// replacing any feed already running for it. Rejected updates are
    /// logged and skipped.
    pub fn spawn_feed<S>(&self, vehicle_id: usize, reports: S)
    where
        S: Stream<Item = PositionReport> + Send + 'static,
    {
        let monitor = self.clone();
        let handle = tokio::spawn(async move {
            let mut reports = Box::pin(reports);
            while let Some(report) = reports.next().await {
                let outcome = monitor
                    .report_position(vehicle_id, report.lat, report.lon, report.observed_at)
                    .await;
                if let Err(e) = outcome {
                    debug!(vehicle_id, error = %e, "feed update skipped");
                }
            }
            debug!(vehicle_id, "position feed ended");
        });
        if let Some(previous) = self.inner.feeds.insert(vehicle_id, handle) {
            previous.abort();
        }
    }

    /// Stops tracking a vehicle: aborts its feed and forgets its state.
    /// Subscribers see the end of their stream. Returns `false` if the
    /// vehicle was not known.
    pub fn end_tracking(&self, vehicle_id: usize) -> bool {
        let feed = self.inner.feeds.remove(&vehicle_id);
        if let Some((_, handle)) = &feed {
            handle.abort();
        }
        let track = self.inner.tracks.remove(&vehicle_id);
        let channel = self.inner.channels.remove(&vehicle_id);
        let known = feed.is_some() || track.is_some() || channel.is_some();
        if known {
            info!(vehicle_id, "tracking ended");
        }
        known
    }

    /// Current state of a vehicle; `Idle` if it is not tracked.
    pub fn vehicle_state(&self, vehicle_id: usize) -> VehicleState {
        self.inner
            .tracks
            .get(&vehicle_id)
            .map_or(VehicleState::Idle, |t| t.lock().state())
    }

    /// Last accepted position, cleared when the route completes.
    pub fn position(&self, vehicle_id: usize) -> Option<VehiclePosition> {
        self.inner
            .tracks
            .get(&vehicle_id)
            .and_then(|t| t.lock().position())
    }

    /// The waypoint the vehicle is expected to head to next.
    pub fn next_waypoint(&self, vehicle_id: usize) -> Option<Location> {
        self.inner
            .tracks
            .get(&vehicle_id)
            .and_then(|t| t.lock().next_waypoint().cloned())
    }

    /// Vehicles with tracking state.
    pub fn tracked_vehicles(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.inner.tracks.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    fn track(&self, vehicle_id: usize) -> Arc<Mutex<VehicleTrack>> {
        let config = &self.inner.config;
        self.inner
            .tracks
            .entry(vehicle_id)
            .or_insert_with(|| Arc::new(Mutex::new(VehicleTrack::new(vehicle_id, config))))
            .clone()
    }

    /// `true` if `entry` is still the live track of the vehicle.
    fn is_tracked(&self, vehicle_id: usize, entry: &Arc<Mutex<VehicleTrack>>) -> bool {
        self.inner
            .tracks
            .get(&vehicle_id)
            .is_some_and(|current| Arc::ptr_eq(current.value(), entry))
    }

    async fn measure(&self, from: GeoPoint, to: &Location) -> Result<f64, ProviderError> {
        let timeout = self.inner.config.provider_timeout();
        let call = self.inner.provider.distance_m(from, to.point());
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(d)) if d.is_finite() && d >= 0.0 => Ok(d),
            Ok(Ok(d)) => Err(ProviderError::InvalidResponse(format!(
                "distance {d} is not a finite non-negative number"
            ))),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProviderError::Timeout(timeout)),
        }
    }

    fn emit_position(&self, track: &VehicleTrack, position: VehiclePosition) {
        self.emit(
            position.vehicle_id,
            TrackingEvent::Position {
                position,
                state: track.state(),
            },
        );
    }

    /// Sends to the vehicle's subscribers, dropping the channel once the
    /// last one has gone.
    fn emit(&self, vehicle_id: usize, event: TrackingEvent) {
        let delivered = match self.inner.channels.get(&vehicle_id) {
            Some(tx) => tx.send(event).is_ok(),
            None => return,
        };
        if !delivered {
            // Re-checked under the shard lock so a concurrent subscribe wins.
            self.inner
                .channels
                .remove_if(&vehicle_id, |_, tx| tx.receiver_count() == 0);
        }
    }
}
