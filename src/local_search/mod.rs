//! Local search operators for improving routes.
//!
//! - [`Move`] — the 2-opt, Or-opt and relocate neighborhood as a tagged enum
//! - [`two_opt_improve`] — intra-route segment reversal
//! - [`or_opt_improve`] — intra-route segment relocation
//! - [`relocate_improve`] — inter-route stop relocation
//! - [`GuidedLocalSearch`] — penalty-guided escape from local optima
//!
//! Every operator is generic over [`RouteCost`](crate::evaluation::RouteCost)
//! so the same code descends on the true cost and on the penalty-augmented
//! cost.

mod guided;
mod moves;
mod or_opt;
mod relocate;
mod two_opt;

pub use guided::{AugmentedCost, EdgePenalties, GuidedLocalSearch, SearchOutcome};
pub use moves::Move;
pub use or_opt::or_opt_improve;
pub use relocate::relocate_improve;
pub use two_opt::two_opt_improve;

/// Smallest cost decrease counted as an improvement.
pub(crate) const IMPROVEMENT_EPS: f64 = 1e-9;
