//! Route and leg types.

use serde::{Deserialize, Serialize};

use super::{Location, Vehicle};

/// One hop of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    /// Where the hop starts.
    pub from: Location,
    /// Where the hop ends.
    pub to: Location,
    /// Hop distance in kilometres.
    pub distance_km: f64,
    /// Driving time plus service time at `to`, in hours.
    pub travel_time_h: f64,
    /// Units delivered so far, including the stop at `to`.
    pub delivered_after: u32,
    /// Urgency of `to` (0 for the depot).
    pub urgency: f64,
}

/// The legs driven by one vehicle, from the depot back to the depot.
///
/// # Examples
///
/// ```
/// use u_fleet::models::{Location, Route, RouteLeg, Vehicle};
///
/// let depot = Location::depot("dc", 0.0, 0.0).unwrap();
/// let store = Location::demand_node("a", 0.0, 1.0).unwrap();
///
/// let mut route = Route::new(Vehicle::new(0, 100));
/// route.push_leg(RouteLeg {
///     from: depot.clone(),
///     to: store.clone(),
///     distance_km: 111.2,
///     travel_time_h: 2.1,
///     delivered_after: 40,
///     urgency: 0.9,
/// });
/// route.push_leg(RouteLeg {
///     from: store,
///     to: depot,
///     distance_km: 111.2,
///     travel_time_h: 1.85,
///     delivered_after: 40,
///     urgency: 0.0,
/// });
/// assert_eq!(route.num_stops(), 1);
/// assert_eq!(route.load(), 40);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    vehicle: Vehicle,
    legs: Vec<RouteLeg>,
}

impl Route {
    /// Creates an empty route for the given vehicle.
    pub fn new(vehicle: Vehicle) -> Self {
        Self {
            vehicle,
            legs: Vec::new(),
        }
    }

    /// Appends a leg to the end of this route.
    pub fn push_leg(&mut self, leg: RouteLeg) {
        self.legs.push(leg);
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn legs(&self) -> &[RouteLeg] {
        &self.legs
    }

    /// Returns `true` if the route has no legs.
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Demand nodes in visit order (the final depot return is excluded).
    pub fn stops(&self) -> impl Iterator<Item = &Location> {
        self.legs.iter().map(|l| &l.to).filter(|l| !l.is_depot())
    }

    /// Number of demand node visits.
    pub fn num_stops(&self) -> usize {
        self.stops().count()
    }

    /// Every leg destination in order, ending with the depot.
    pub fn waypoints(&self) -> Vec<Location> {
        self.legs.iter().map(|l| l.to.clone()).collect()
    }

    /// Location ids of the stops in visit order.
    pub fn stop_ids(&self) -> Vec<&str> {
        self.stops().map(|l| l.id()).collect()
    }

    /// Total units delivered by this route.
    pub fn load(&self) -> u32 {
        self.legs.last().map_or(0, |l| l.delivered_after)
    }

    /// Total distance in kilometres.
    pub fn distance_km(&self) -> f64 {
        self.legs.iter().map(|l| l.distance_km).sum()
    }

    /// Total duration in hours, service included.
    pub fn duration_h(&self) -> f64 {
        self.legs.iter().map(|l| l.travel_time_h).sum()
    }

    /// Zero-based visit position of a stop, if the route serves it.
    pub fn position_of(&self, location_id: &str) -> Option<usize> {
        self.stops().position(|l| l.id() == location_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(from: &Location, to: &Location, km: f64, delivered: u32) -> RouteLeg {
        RouteLeg {
            from: from.clone(),
            to: to.clone(),
            distance_km: km,
            travel_time_h: km / 60.0,
            delivered_after: delivered,
            urgency: 0.0,
        }
    }

    #[test]
    fn test_route_empty() {
        let r = Route::new(Vehicle::new(0, 10));
        assert!(r.is_empty());
        assert_eq!(r.load(), 0);
        assert_eq!(r.distance_km(), 0.0);
        assert!(r.waypoints().is_empty());
    }

    #[test]
    fn test_route_accessors() {
        let d = Location::depot("dc", 0.0, 0.0).expect("valid");
        let a = Location::demand_node("a", 0.0, 1.0).expect("valid");
        let b = Location::demand_node("b", 0.0, 2.0).expect("valid");
        let mut r = Route::new(Vehicle::new(1, 100));
        r.push_leg(leg(&d, &a, 10.0, 30));
        r.push_leg(leg(&a, &b, 5.0, 70));
        r.push_leg(leg(&b, &d, 15.0, 70));

        assert_eq!(r.stop_ids(), vec!["a", "b"]);
        assert_eq!(r.num_stops(), 2);
        assert_eq!(r.load(), 70);
        assert!((r.distance_km() - 30.0).abs() < 1e-10);
        assert!((r.duration_h() - 0.5).abs() < 1e-10);
        assert_eq!(r.position_of("b"), Some(1));
        assert_eq!(r.position_of("zz"), None);
        let ids: Vec<String> = r.waypoints().iter().map(|l| l.id().to_string()).collect();
        assert_eq!(ids, vec!["a", "b", "dc"]);
    }
}
