//! Distance sources and matrices.
//!
//! Provides a dense distance matrix for routing problems and the provider
//! traits it is filled from.

mod matrix;
mod provider;

pub use matrix::DistanceMatrix;
pub use provider::{
    haversine_m, AsyncDistanceProvider, BlockingProvider, DistanceProvider, Haversine,
    EARTH_RADIUS_M,
};
