//! Route plan persistence and publication.
//!
//! - [`PlanStore`] — persist-then-swap publication of the current plan
//! - [`PlanSink`] — the persistence collaborator, with [`MemorySink`] and
//!   [`JsonFileSink`] implementations

mod plan_store;
mod sink;

pub use plan_store::{PlanStore, StoredPlan};
pub use sink::{JsonFileSink, MemorySink, PlanSink};
