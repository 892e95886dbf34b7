//! Geographic points and routing locations.

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// A WGS84 coordinate in decimal degrees.
///
/// # Examples
///
/// ```
/// use u_fleet::models::GeoPoint;
///
/// let p = GeoPoint::new(33.749, -84.388).unwrap();
/// assert_eq!(p.lat(), 33.749);
/// assert!(GeoPoint::new(95.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    /// Creates a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InputError> {
        let point = Self { lat, lon };
        point.validate("")?;
        Ok(point)
    }

    /// Latitude in degrees, within `[-90, 90]`.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees, within `[-180, 180]`.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Re-checks the range, naming `id` in the error. Points that arrive
    /// through deserialization skip [`GeoPoint::new`].
    pub fn validate(&self, id: &str) -> Result<(), InputError> {
        let ok = self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon);
        if ok {
            Ok(())
        } else {
            Err(InputError::InvalidCoordinate {
                id: id.to_string(),
                lat: self.lat,
                lon: self.lon,
            })
        }
    }
}

/// The part a location plays in a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationRole {
    /// Origin and terminus of every route.
    Depot,
    /// A store or drop point that may carry unmet demand.
    DemandNode,
}

/// A named place on the map.
///
/// # Examples
///
/// ```
/// use u_fleet::models::{Location, LocationRole};
///
/// let depot = Location::depot("atlanta-dc", 33.749, -84.388).unwrap();
/// assert_eq!(depot.role(), LocationRole::Depot);
/// assert_eq!(depot.id(), "atlanta-dc");
///
/// assert!(Location::demand_node("bad", 0.0, 200.0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    id: String,
    point: GeoPoint,
    role: LocationRole,
}

impl Location {
    /// Creates a location with the given role.
    pub fn new(
        id: impl Into<String>,
        lat: f64,
        lon: f64,
        role: LocationRole,
    ) -> Result<Self, InputError> {
        let id = id.into();
        let point = GeoPoint { lat, lon };
        point.validate(&id)?;
        Ok(Self { id, point, role })
    }

    /// Creates the depot location.
    pub fn depot(id: impl Into<String>, lat: f64, lon: f64) -> Result<Self, InputError> {
        Self::new(id, lat, lon, LocationRole::Depot)
    }

    /// Creates a demand node location.
    pub fn demand_node(id: impl Into<String>, lat: f64, lon: f64) -> Result<Self, InputError> {
        Self::new(id, lat, lon, LocationRole::DemandNode)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn point(&self) -> GeoPoint {
        self.point
    }

    pub fn role(&self) -> LocationRole {
        self.role
    }

    pub fn is_depot(&self) -> bool {
        self.role == LocationRole::Depot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_bounds() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
        assert!(GeoPoint::new(90.1, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_location_error_names_id() {
        let err = Location::demand_node("store-7", 100.0, 0.0).unwrap_err();
        assert_eq!(
            err,
            InputError::InvalidCoordinate {
                id: "store-7".into(),
                lat: 100.0,
                lon: 0.0,
            }
        );
    }

    #[test]
    fn test_roles() {
        let d = Location::depot("dc", 0.0, 0.0).expect("valid");
        let s = Location::demand_node("s", 0.0, 1.0).expect("valid");
        assert!(d.is_depot());
        assert!(!s.is_depot());
        assert_eq!(s.point().lon(), 1.0);
    }

    #[test]
    fn test_deserialized_point_can_be_revalidated() {
        let p: GeoPoint = serde_json::from_str(r#"{"lat": 120.0, "lon": 0.0}"#).expect("parses");
        assert!(p.validate("x").is_err());
    }
}
