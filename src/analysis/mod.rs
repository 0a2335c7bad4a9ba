//! Game Analysis
//!
//! Memoized statistics over slices of the mirrored collection.
//!
//! - **engine**: filtering, `auto` resolution and the fold into an aggregate
//! - **memo**: per-game fact cache keyed by (url, nick)
//! - **aggregate**: result types

pub mod aggregate;
pub mod engine;
pub mod memo;

pub use aggregate::{Aggregate, GraphPoint, PerGameFact};
pub use engine::{compute_fact, AnalysisEngine};
pub use memo::FactCache;
