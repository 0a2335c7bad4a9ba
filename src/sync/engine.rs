//! Sync Engine
//!
//! Owns the authoritative game collection and the change-detection
//! snapshots, and keeps both in step with a [`MonthSource`]:
//! - Full load: every month from the start date through now, swapped in at once
//! - Refresh: current month only, inserting new games and replacing changed ones
//!
//! Refresh assumes games of past months are final. Edits the archive makes
//! to older months are only picked up by the next full load.

use crate::fetch::{months_between, FetchStatus, MonthBatch, MonthSource};
use crate::games::{Game, GameCollection, Upsert};
use crate::sync::clock::Clock;
use crate::sync::snapshot::SnapshotCache;
use chrono::{DateTime, Datelike, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Configuration for sync behavior
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Month fetches in flight during a full load (1 = strictly sequential)
    pub max_concurrent_months: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrent_months: 1,
        }
    }
}

/// Errors returned by the sync engine
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SyncError {
    /// A load or refresh is already running on this engine
    #[error("A sync is already in progress")]
    InProgress,
}

/// What a sync fetched and kept
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub months_requested: usize,
    /// Months whose fetch failed and contributed nothing
    pub months_failed: Vec<(i32, u32)>,
    /// Months whose payload had no games array
    pub months_malformed: Vec<(i32, u32)>,
    pub records_fetched: usize,
    pub records_dropped: usize,
    /// Records that passed the retention policy
    pub records_retained: usize,
}

impl SyncReport {
    fn absorb(&mut self, batch: &MonthBatch) {
        self.months_requested += 1;
        self.records_fetched += batch.games.len();
        self.records_dropped += batch.dropped;

        match batch.status {
            FetchStatus::Ok => {}
            FetchStatus::Failed { .. } => self.months_failed.push((batch.year, batch.month)),
            FetchStatus::MalformedPayload => {
                self.months_malformed.push((batch.year, batch.month))
            }
        }
    }

    /// Every month fetched cleanly
    pub fn is_complete(&self) -> bool {
        self.months_failed.is_empty() && self.months_malformed.is_empty()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "months={} failed={} malformed={} fetched={} dropped={} retained={}",
            self.months_requested,
            self.months_failed.len(),
            self.months_malformed.len(),
            self.records_fetched,
            self.records_dropped,
            self.records_retained
        )
    }
}

/// Result of an incremental refresh
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshOutcome {
    /// Whether any game was inserted or replaced
    pub changed: bool,
    pub inserted: usize,
    /// Urls whose stored game was replaced
    pub replaced: Vec<String>,
    pub report: SyncReport,
}

/// Retention policy shared by full load and refresh
pub fn retains(game: &Game, start: DateTime<Utc>, include_unrated: bool) -> bool {
    (include_unrated || game.rated) && game.end_time >= start.timestamp()
}

/// Owns the mirrored collection and its snapshots
pub struct SyncEngine {
    source: Arc<dyn MonthSource>,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
    games: RwLock<GameCollection>,
    snapshots: RwLock<SnapshotCache>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a sync ends, however it ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncEngine {
    pub fn new(source: Arc<dyn MonthSource>, clock: Arc<dyn Clock>, config: SyncConfig) -> Self {
        Self {
            source,
            clock,
            config,
            games: RwLock::new(GameCollection::new()),
            snapshots: RwLock::new(SnapshotCache::new()),
            in_flight: AtomicBool::new(false),
        }
    }

    fn begin(&self) -> Result<InFlightGuard<'_>, SyncError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlightGuard(&self.in_flight))
            .map_err(|_| SyncError::InProgress)
    }

    /// Whether a load or refresh is running
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Replace the collection with a fresh download of `start`'s month through now
    ///
    /// The previous collection stays readable until every month has been
    /// fetched; the new one is then installed in a single swap.
    pub async fn load_history(
        &self,
        nick: &str,
        start: DateTime<Utc>,
        include_unrated: bool,
    ) -> Result<SyncReport, SyncError> {
        self.load_history_with(nick, start, include_unrated, || async {})
            .await
    }

    /// [`load_history`](Self::load_history), running `on_install` after the
    /// swap and before readers can see the new collection
    pub async fn load_history_with<F, Fut>(
        &self,
        nick: &str,
        start: DateTime<Utc>,
        include_unrated: bool,
        on_install: F,
    ) -> Result<SyncReport, SyncError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let _guard = self.begin()?;

        let months = months_between(start, self.clock.now());
        tracing::info!(
            nick,
            source = self.source.name(),
            months = months.len(),
            "Loading game history"
        );

        let batches = self.fetch_months(nick, &months).await;

        let mut report = SyncReport::default();
        let mut fresh_snapshots = SnapshotCache::new();
        let mut retained = Vec::new();

        for batch in batches {
            report.absorb(&batch);
            for game in batch.games {
                // Every fetched record gets a snapshot, retained or not.
                fresh_snapshots.record(&game);
                if retains(&game, start, include_unrated) {
                    retained.push(game);
                }
            }
        }

        let collection = GameCollection::from_games(retained);
        report.records_retained = collection.len();

        {
            let mut games = self.games.write().await;
            let mut snapshots = self.snapshots.write().await;
            *games = collection;
            *snapshots = fresh_snapshots;
            on_install().await;
        }

        if report.is_complete() {
            tracing::info!(nick, %report, "Game history loaded");
        } else {
            tracing::warn!(nick, %report, "Game history loaded with missing months");
        }

        Ok(report)
    }

    /// Fetch the current month and merge it into the collection
    pub async fn refresh(
        &self,
        nick: &str,
        start: DateTime<Utc>,
        include_unrated: bool,
    ) -> Result<RefreshOutcome, SyncError> {
        self.refresh_with(nick, start, include_unrated, |_| async {})
            .await
    }

    /// [`refresh`](Self::refresh), running `on_replaced` with the replaced
    /// urls before readers can see the replacements
    ///
    /// `on_replaced` is not called when nothing was replaced.
    pub async fn refresh_with<F, Fut>(
        &self,
        nick: &str,
        start: DateTime<Utc>,
        include_unrated: bool,
        on_replaced: F,
    ) -> Result<RefreshOutcome, SyncError>
    where
        F: FnOnce(Vec<String>) -> Fut,
        Fut: Future<Output = ()>,
    {
        let _guard = self.begin()?;

        let now = self.clock.now();
        let batch = self.source.fetch_month(nick, now.year(), now.month()).await;

        let mut outcome = RefreshOutcome::default();
        outcome.report.absorb(&batch);

        if batch.games.is_empty() {
            return Ok(outcome);
        }

        let mut games = self.games.write().await;
        let mut snapshots = self.snapshots.write().await;

        for game in batch
            .games
            .into_iter()
            .filter(|g| retains(g, start, include_unrated))
        {
            outcome.report.records_retained += 1;

            if games.contains(&game.url) && !snapshots.is_changed(&game) {
                continue;
            }

            snapshots.record(&game);
            let url = game.url.clone();
            match games.upsert(game) {
                Upsert::Inserted => outcome.inserted += 1,
                Upsert::Replaced => {
                    tracing::debug!(url = %url, "Game changed since last fetch");
                    outcome.replaced.push(url);
                }
            }
        }

        if !outcome.replaced.is_empty() {
            on_replaced(outcome.replaced.clone()).await;
        }
        drop(snapshots);
        drop(games);

        outcome.changed = outcome.inserted > 0 || !outcome.replaced.is_empty();

        tracing::debug!(
            nick,
            inserted = outcome.inserted,
            replaced = outcome.replaced.len(),
            "Refresh complete"
        );

        Ok(outcome)
    }

    /// Fetch months in order with at most `max_concurrent_months` in flight
    async fn fetch_months(&self, nick: &str, months: &[(i32, u32)]) -> Vec<MonthBatch> {
        let concurrency = self.config.max_concurrent_months.max(1);

        stream::iter(months.iter().copied())
            .map(|(year, month)| self.source.fetch_month(nick, year, month))
            .buffered(concurrency)
            .collect()
            .await
    }

    /// Read access to the authoritative collection
    pub async fn games(&self) -> RwLockReadGuard<'_, GameCollection> {
        self.games.read().await
    }

    pub async fn game_count(&self) -> usize {
        self.games.read().await.len()
    }

    pub async fn snapshot_count(&self) -> usize {
        self.snapshots.read().await.len()
    }

    /// Forget all change-detection snapshots
    pub async fn reset_snapshots(&self) {
        self.snapshots.write().await.clear();
    }
}
