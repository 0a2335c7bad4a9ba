//! # chessmirror
//!
//! A local mirror of one player's online chess history, kept in sync with a
//! month-paged remote archive, with memoized statistics per time class and
//! rule set.
//!
//! ## Modules
//!
//! - [`games`]: Game records and the url-keyed collection
//! - [`pgn`]: PGN header parsing and game duration
//! - [`fetch`]: Month sources, including the chess.com archive client
//! - [`sync`]: Full load and incremental refresh with change detection
//! - [`analysis`]: Memoized aggregation
//! - [`tracker`]: The facade tying sync and analysis together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chessmirror::{ChessComClient, FetchConfig, GameTracker, Selector, SyncConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(ChessComClient::new(FetchConfig::default())?);
//!     let tracker = GameTracker::new(source, SyncConfig::default());
//!
//!     let since = chrono::Utc::now() - chrono::Duration::days(60);
//!     let report = tracker.load_history("hikaru", since, false).await?;
//!     println!("Loaded: {}", report);
//!
//!     let stats = tracker.analyze("hikaru", &Selector::Auto, &Selector::Auto).await;
//!     println!("{} games, {} wins", stats.count, stats.win);
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod fetch;
pub mod games;
pub mod pgn;
pub mod sync;
pub mod tracker;

// Re-export top-level types for convenience
pub use analysis::{Aggregate, AnalysisEngine, FactCache, GraphPoint, PerGameFact};

pub use config::{Config, ConfigError, FetchSettings, LoggingConfig, SyncSettings};

pub use fetch::{ChessComClient, FetchConfig, FetchError, FetchStatus, MonthBatch, MonthSource};

pub use games::{Game, GameCollection, Player, Selector};

pub use pgn::{extract_duration, parse_tags, try_extract_duration, PgnError};

pub use sync::{
    Clock, FixedClock, RefreshOutcome, SnapshotCache, SyncConfig, SyncEngine, SyncError,
    SyncReport, SystemClock,
};

pub use tracker::{GameTracker, TrackerStats};
