//! Dense distance matrix.

use super::DistanceProvider;
use crate::error::ProviderError;
use crate::models::GeoPoint;

/// A dense n×n distance matrix stored in row-major order, in kilometres.
///
/// Supports construction from coordinates through any
/// [`DistanceProvider`] and explicit distance specification.
///
/// # Examples
///
/// ```
/// use u_fleet::distance::{DistanceMatrix, Haversine};
/// use u_fleet::models::GeoPoint;
///
/// let points = vec![
///     GeoPoint::new(0.0, 0.0).unwrap(),
///     GeoPoint::new(0.0, 1.0).unwrap(),
/// ];
/// let dm = DistanceMatrix::from_points(&points, &Haversine).unwrap();
/// assert!((dm.get(0, 1) - 111.19).abs() < 0.01);
/// assert_eq!(dm.size(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    /// Creates a distance matrix of the given size, initialized to zero.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0.0; size * size],
            size,
        }
    }

    /// Computes a symmetric matrix from coordinates. The provider answers in
    /// metres; the matrix holds kilometres.
    pub fn from_points(
        points: &[GeoPoint],
        provider: &dyn DistanceProvider,
    ) -> Result<Self, ProviderError> {
        let n = points.len();
        let mut dm = Self::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                let metres = provider.distance_m(points[i], points[j])?;
                if !metres.is_finite() || metres < 0.0 {
                    return Err(ProviderError::InvalidResponse(format!(
                        "distance {metres} between points {i} and {j}"
                    )));
                }
                let d = metres / 1000.0;
                dm.set(i, j, d);
                dm.set(j, i, d);
            }
        }
        Ok(dm)
    }

    /// Creates a distance matrix from an explicit n×n grid.
    ///
    /// Returns `None` if the data length doesn't match `size * size`.
    pub fn from_data(size: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != size * size {
            return None;
        }
        Some(Self { data, size })
    }

    /// Returns the distance from location `from` to location `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Sets the distance from location `from` to location `to`.
    pub fn set(&mut self, from: usize, to: usize, distance: f64) {
        self.data[from * self.size + to] = distance;
    }

    /// Number of locations in this matrix.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if the matrix is symmetric within the given tolerance.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                if (self.get(i, j) - self.get(j, i)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// Smallest strictly positive off-diagonal entry, if any.
    pub fn min_positive(&self) -> Option<f64> {
        let mut best: Option<f64> = None;
        for i in 0..self.size {
            for j in 0..self.size {
                let d = self.get(i, j);
                if i != j && d > 0.0 && best.is_none_or(|b| d < b) {
                    best = Some(d);
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Haversine;

    fn sample_points() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(0.0, 0.0).expect("valid"),
            GeoPoint::new(0.0, 1.0).expect("valid"),
            GeoPoint::new(0.0, 2.0).expect("valid"),
        ]
    }

    struct Broken;

    impl DistanceProvider for Broken {
        fn distance_m(&self, _: GeoPoint, _: GeoPoint) -> Result<f64, ProviderError> {
            Err(ProviderError::Unavailable("offline".into()))
        }
    }

    struct Negative;

    impl DistanceProvider for Negative {
        fn distance_m(&self, _: GeoPoint, _: GeoPoint) -> Result<f64, ProviderError> {
            Ok(-1.0)
        }
    }

    #[test]
    fn test_from_points() {
        let dm = DistanceMatrix::from_points(&sample_points(), &Haversine).expect("ok");
        assert_eq!(dm.size(), 3);
        assert!((dm.get(0, 1) - 111.195).abs() < 0.01);
        assert!((dm.get(0, 2) - 222.39).abs() < 0.01);
        assert_eq!(dm.get(1, 1), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let dm = DistanceMatrix::from_points(&sample_points(), &Haversine).expect("ok");
        assert!(dm.is_symmetric(1e-10));
    }

    #[test]
    fn test_provider_failure_propagates() {
        let err = DistanceMatrix::from_points(&sample_points(), &Broken).unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
        let err = DistanceMatrix::from_points(&sample_points(), &Negative).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn test_from_data() {
        let dm = DistanceMatrix::from_data(2, vec![0.0, 5.0, 5.0, 0.0]).expect("valid");
        assert_eq!(dm.get(0, 1), 5.0);
        assert_eq!(dm.get(1, 0), 5.0);
    }

    #[test]
    fn test_from_data_invalid_size() {
        assert!(DistanceMatrix::from_data(2, vec![0.0, 1.0, 2.0]).is_none());
    }

    #[test]
    fn test_set_get() {
        let mut dm = DistanceMatrix::new(3);
        dm.set(0, 1, 42.0);
        assert_eq!(dm.get(0, 1), 42.0);
        assert_eq!(dm.get(1, 0), 0.0);
    }

    #[test]
    fn test_min_positive() {
        let dm = DistanceMatrix::from_data(3, vec![0.0, 4.0, 0.0, 4.0, 0.0, 2.5, 0.0, 2.5, 0.0])
            .expect("valid");
        assert_eq!(dm.min_positive(), Some(2.5));
        assert_eq!(DistanceMatrix::new(2).min_positive(), None);
    }

    #[test]
    fn test_asymmetric_matrix() {
        let mut dm = DistanceMatrix::new(2);
        dm.set(0, 1, 10.0);
        dm.set(1, 0, 15.0);
        assert!(!dm.is_symmetric(1e-10));
    }
}
