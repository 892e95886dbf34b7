//! Distance sources.
//!
//! The network builder asks a [`DistanceProvider`] synchronously while it
//! fills the matrix; the tracking monitor asks an [`AsyncDistanceProvider`]
//! under a timeout. [`Haversine`] implements both, and [`BlockingProvider`]
//! lets the monitor reuse whatever sync source built the network.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::models::GeoPoint;

/// Mean earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points, in metres.
///
/// # Examples
///
/// ```
/// use u_fleet::distance::haversine_m;
/// use u_fleet::models::GeoPoint;
///
/// let a = GeoPoint::new(0.0, 0.0).unwrap();
/// let b = GeoPoint::new(0.0, 1.0).unwrap();
/// assert!((haversine_m(a, b) - 111_194.9).abs() < 1.0);
/// ```
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let d_lat = (b.lat() - a.lat()).to_radians();
    let d_lon = (b.lon() - a.lon()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// A synchronous distance source, answering in metres.
pub trait DistanceProvider: Send + Sync {
    fn distance_m(&self, from: GeoPoint, to: GeoPoint) -> Result<f64, ProviderError>;
}

/// An asynchronous distance source, answering in metres. Road-network and
/// directions services implement this; callers must tolerate failure.
#[async_trait]
pub trait AsyncDistanceProvider: Send + Sync {
    async fn distance_m(&self, from: GeoPoint, to: GeoPoint) -> Result<f64, ProviderError>;
}

/// Great-circle approximation. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl DistanceProvider for Haversine {
    fn distance_m(&self, from: GeoPoint, to: GeoPoint) -> Result<f64, ProviderError> {
        Ok(haversine_m(from, to))
    }
}

#[async_trait]
impl AsyncDistanceProvider for Haversine {
    async fn distance_m(&self, from: GeoPoint, to: GeoPoint) -> Result<f64, ProviderError> {
        Ok(haversine_m(from, to))
    }
}

/// Exposes a synchronous provider through [`AsyncDistanceProvider`].
///
/// The wrapped call runs inline, so it should be cheap (a formula or a
/// cache lookup), not a network round trip.
#[derive(Debug, Clone)]
pub struct BlockingProvider<P>(pub Arc<P>);

impl<P> BlockingProvider<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self(provider)
    }
}

#[async_trait]
impl<P: DistanceProvider + 'static> AsyncDistanceProvider for BlockingProvider<P> {
    async fn distance_m(&self, from: GeoPoint, to: GeoPoint) -> Result<f64, ProviderError> {
        self.0.distance_m(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).expect("valid")
    }

    #[test]
    fn test_haversine_zero() {
        assert_eq!(haversine_m(p(12.5, 77.6), p(12.5, 77.6)), 0.0);
    }

    #[test]
    fn test_haversine_meridian_degree() {
        // One degree of latitude on a sphere of radius R is R * pi / 180.
        let expected = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        assert!((haversine_m(p(10.0, 5.0), p(11.0, 5.0)) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = p(33.749, -84.388);
        let b = p(29.7604, -95.3698);
        assert!((haversine_m(a, b) - haversine_m(b, a)).abs() < 1e-9);
        // Atlanta to Houston is roughly 1130 km.
        assert!((haversine_m(a, b) / 1000.0 - 1130.0).abs() < 15.0);
    }

    #[test]
    fn test_haversine_antipodes_finite() {
        let d = haversine_m(p(0.0, 0.0), p(0.0, 180.0));
        assert!((d - EARTH_RADIUS_M * std::f64::consts::PI).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_blocking_provider_delegates() {
        let provider = BlockingProvider::new(Arc::new(Haversine));
        let d = AsyncDistanceProvider::distance_m(&provider, p(0.0, 0.0), p(0.0, 1.0))
            .await
            .expect("never fails");
        assert!((d - 111_194.9).abs() < 1.0);
    }
}
