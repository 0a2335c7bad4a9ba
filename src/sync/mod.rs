//! Game Synchronization
//!
//! Keeps the local mirror in step with a remote month source.
//!
//! - **engine**: full load and incremental refresh of the collection
//! - **snapshot**: canonical snapshots used to detect changed records
//! - **clock**: injectable time source
//!
//! # Data Flow
//!
//! ```text
//! MonthSource → batches → retention policy → GameCollection
//!                      └→ SnapshotCache (every fetched record)
//! ```

pub mod clock;
pub mod engine;
pub mod snapshot;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{retains, RefreshOutcome, SyncConfig, SyncEngine, SyncError, SyncReport};
pub use snapshot::SnapshotCache;
