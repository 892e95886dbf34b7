//! Fleet vehicles.

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// A delivery vehicle. Fleet configuration is static and read-only to the
/// solver.
///
/// # Examples
///
/// ```
/// use u_fleet::models::Vehicle;
///
/// let v = Vehicle::new(0, 5000);
/// assert_eq!(v.id(), 0);
/// assert_eq!(v.capacity(), 5000);
/// assert!(v.validate().is_ok());
/// assert!(Vehicle::new(1, 0).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    id: usize,
    capacity: u32,
}

impl Vehicle {
    /// Creates a vehicle with the given ID and capacity.
    pub fn new(id: usize, capacity: u32) -> Self {
        Self { id, capacity }
    }

    /// Vehicle ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Maximum load capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Rejects zero capacity.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.capacity == 0 {
            return Err(InputError::InvalidVehicle {
                id: self.id,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}
