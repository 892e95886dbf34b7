//! Synthetic position feeds for demos and tests.
//!
//! Generates GPS reports along a planned route, optionally displaced
//! sideways so a deviation monitor has something to catch.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::Stream;

use crate::models::{GeoPoint, Route};

use super::PositionReport;

/// Metres per degree of latitude on the mean earth sphere.
const METRES_PER_DEGREE: f64 = 111_194.93;

/// Reports spaced evenly along every leg of `route`.
///
/// Each leg contributes `points_per_leg` reports, the last of which lands on
/// the leg's destination. Every point is shifted `offset_m` metres north
/// (negative for south). Timestamps start at `start` and advance by
/// `interval`.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use u_fleet::models::{Location, Route, RouteLeg, Vehicle};
/// use u_fleet::tracking::simulate::route_trace;
///
/// let depot = Location::depot("dc", 0.0, 0.0).unwrap();
/// let a = Location::demand_node("a", 0.0, 0.02).unwrap();
/// let mut route = Route::new(Vehicle::new(0, 10));
/// for (from, to) in [(&depot, &a), (&a, &depot)] {
///     route.push_leg(RouteLeg {
///         from: from.clone(),
///         to: to.clone(),
///         distance_km: 2.2,
///         travel_time_h: 0.05,
///         delivered_after: 4,
///         urgency: 0.0,
///     });
/// }
///
/// let trace = route_trace(&route, 4, 0.0, Utc::now(), Duration::seconds(30));
/// assert_eq!(trace.len(), 8);
/// assert!((trace[1].lon - 0.01).abs() < 1e-12);
/// assert_eq!(trace[3].lon, 0.02);
/// ```
pub fn route_trace(
    route: &Route,
    points_per_leg: usize,
    offset_m: f64,
    start: DateTime<Utc>,
    interval: chrono::Duration,
) -> Vec<PositionReport> {
    let offset_deg = offset_m / METRES_PER_DEGREE;
    let mut reports = Vec::with_capacity(route.legs().len() * points_per_leg);
    let mut observed_at = start;

    for leg in route.legs() {
        let from = leg.from.point();
        let to = leg.to.point();
        for k in 1..=points_per_leg {
            let f = k as f64 / points_per_leg as f64;
            let p = interpolate(from, to, f);
            reports.push(PositionReport {
                lat: (p.lat() + offset_deg).clamp(-90.0, 90.0),
                lon: p.lon(),
                observed_at,
            });
            observed_at += interval;
        }
    }
    reports
}

/// Linear interpolation in degree space. Good enough over city-scale legs.
fn interpolate(from: GeoPoint, to: GeoPoint, f: f64) -> GeoPoint {
    let lat = from.lat() + (to.lat() - from.lat()) * f;
    let lon = from.lon() + (to.lon() - from.lon()) * f;
    GeoPoint::new(lat, lon).unwrap_or(to)
}

/// Yields `reports` as fast as they are polled.
pub fn feed(reports: Vec<PositionReport>) -> impl Stream<Item = PositionReport> + Send + 'static {
    futures::stream::iter(reports)
}

/// Yields `reports` one every `period` of wall (or paused tokio) time.
pub fn paced(
    reports: Vec<PositionReport>,
    period: Duration,
) -> impl Stream<Item = PositionReport> + Send + 'static {
    futures::stream::unfold(reports.into_iter(), move |mut rest| async move {
        let next = rest.next()?;
        tokio::time::sleep(period).await;
        Some((next, rest))
    })
}
