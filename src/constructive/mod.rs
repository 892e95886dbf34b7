//! Initial solution construction.
//!
//! - [`admit`] — drops demand the fleet cannot carry, O(n log n)
//! - [`cheapest_insertion`] — capacity-aware cheapest insertion, O(n³m)

mod admission;
mod insertion;

pub use admission::{admit, Admission};
pub use insertion::{cheapest_insertion, Construction};
