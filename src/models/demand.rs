//! Unmet-demand requests produced by the forecasting collaborator.

use serde::{Deserialize, Serialize};

use super::Location;
use crate::error::InputError;

/// Unmet demand at one location, with a normalized urgency score.
///
/// Requests are values: a newer forecast produces a new request rather than
/// mutating an old one.
///
/// # Examples
///
/// ```
/// use u_fleet::models::{DemandRequest, Location};
///
/// let store = Location::demand_node("houston", 29.76, -95.37).unwrap();
/// let req = DemandRequest::new(store, 120, 0.8).unwrap();
/// assert_eq!(req.quantity(), 120);
/// assert_eq!(req.urgency(), 0.8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRequest {
    location: Location,
    quantity: u32,
    urgency: f64,
}

impl DemandRequest {
    /// Creates a request. Urgency must lie in `[0, 1]`.
    pub fn new(location: Location, quantity: u32, urgency: f64) -> Result<Self, InputError> {
        let req = Self {
            location,
            quantity,
            urgency,
        };
        req.validate()?;
        Ok(req)
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Units still to deliver.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// How overdue the restock is, in `[0, 1]`.
    pub fn urgency(&self) -> f64 {
        self.urgency
    }

    pub fn validate(&self) -> Result<(), InputError> {
        self.location.point().validate(self.location.id())?;
        if !(0.0..=1.0).contains(&self.urgency) {
            return Err(InputError::InvalidUrgency {
                id: self.location.id().to_string(),
                urgency: self.urgency,
            });
        }
        Ok(())
    }
}
