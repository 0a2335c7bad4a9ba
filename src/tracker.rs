//! Game Tracker
//!
//! The engine-facing API. Owns one [`SyncEngine`] and one
//! [`AnalysisEngine`] and keeps the fact memo coherent with the collection:
//! a full load drops every memoized fact, a refresh evicts the facts of
//! every game it replaced. Both happen before the new games become
//! readable, so `analyze` never pairs a new game with an old fact.

use crate::analysis::{Aggregate, AnalysisEngine};
use crate::fetch::MonthSource;
use crate::games::{Game, Selector};
use crate::sync::{Clock, RefreshOutcome, SyncConfig, SyncEngine, SyncError, SyncReport, SystemClock};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Mirror of one player's game history with memoized statistics
pub struct GameTracker {
    sync: SyncEngine,
    analysis: AnalysisEngine,
}

/// Sizes of the tracker's collection and caches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackerStats {
    pub games: usize,
    pub snapshots: usize,
    pub cached_facts: usize,
}

impl fmt::Display for TrackerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "games={}, snapshots={}, cached_facts={}",
            self.games, self.snapshots, self.cached_facts
        )
    }
}

impl GameTracker {
    /// Create a tracker on the wall clock
    pub fn new(source: Arc<dyn MonthSource>, config: SyncConfig) -> Self {
        Self::with_clock(source, Arc::new(SystemClock), config)
    }

    pub fn with_clock(source: Arc<dyn MonthSource>, clock: Arc<dyn Clock>, config: SyncConfig) -> Self {
        Self {
            sync: SyncEngine::new(source, clock, config),
            analysis: AnalysisEngine::new(),
        }
    }

    /// Replace the mirror with every game since `start`
    pub async fn load_history(
        &self,
        nick: &str,
        start: DateTime<Utc>,
        include_unrated: bool,
    ) -> Result<SyncReport, SyncError> {
        self.sync
            .load_history_with(nick, start, include_unrated, || self.analysis.clear())
            .await
    }

    /// Merge the current month into the mirror
    ///
    /// `outcome.changed` is true iff a game was inserted or replaced.
    pub async fn refresh(
        &self,
        nick: &str,
        start: DateTime<Utc>,
        include_unrated: bool,
    ) -> Result<RefreshOutcome, SyncError> {
        let analysis = &self.analysis;
        self.sync
            .refresh_with(nick, start, include_unrated, |replaced| async move {
                let evicted = analysis.evict(replaced.iter().map(String::as_str)).await;
                tracing::debug!(evicted, "Evicted facts of replaced games");
            })
            .await
    }

    /// Statistics of `nick` for a time class and rule set, either may be `auto`
    pub async fn analyze(&self, nick: &str, time_class: &Selector, rules: &Selector) -> Aggregate {
        let games = self.sync.games().await;
        self.analysis.analyze(&games, nick, time_class, rules).await
    }

    /// Drop memoized facts of `nick`, optionally scoped to a time class and/or rule set
    pub async fn invalidate(&self, nick: &str, time_class: Option<&str>, rules: Option<&str>) -> usize {
        self.analysis.invalidate(nick, time_class, rules).await
    }

    /// Forget memoized facts and change-detection snapshots, e.g. when switching players
    pub async fn reset(&self) {
        self.analysis.clear().await;
        self.sync.reset_snapshots().await;
    }

    /// Copy of the mirrored games in collection order
    pub async fn games(&self) -> Vec<Game> {
        self.sync.games().await.iter().cloned().collect()
    }

    pub async fn stats(&self) -> TrackerStats {
        TrackerStats {
            games: self.sync.game_count().await,
            snapshots: self.sync.snapshot_count().await,
            cached_facts: self.analysis.cached_facts().await,
        }
    }
}
