//! Month Sources
//!
//! A month source returns one calendar month of a player's games. The
//! contract is fail-open: a source never errors, it returns an empty batch
//! and says why in [`FetchStatus`].
//!
//! - **chesscom**: HTTP source for the public chess.com game archive

mod chesscom;

pub use chesscom::{ChessComClient, FetchConfig};

use crate::games::Game;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use serde_json::Value;

/// Common trait for anything that can serve a month of games
#[async_trait]
pub trait MonthSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Fetch every game `nick` finished in `year`/`month` (1-12)
    async fn fetch_month(&self, nick: &str, year: i32, month: u32) -> MonthBatch;
}

/// Games of one calendar month
#[derive(Debug, Clone)]
pub struct MonthBatch {
    pub year: i32,
    pub month: u32,
    pub games: Vec<Game>,
    /// Elements of the payload that were not usable game records
    pub dropped: usize,
    pub status: FetchStatus,
}

/// How a month fetch went
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    /// Transport or HTTP failure after all retries
    Failed { error: String },
    /// The response had no `games` array
    MalformedPayload,
}

impl MonthBatch {
    pub fn new(year: i32, month: u32, games: Vec<Game>) -> Self {
        Self {
            year,
            month,
            games,
            dropped: 0,
            status: FetchStatus::Ok,
        }
    }

    pub fn empty(year: i32, month: u32, status: FetchStatus) -> Self {
        Self {
            year,
            month,
            games: Vec::new(),
            dropped: 0,
            status,
        }
    }

    /// Decode an archive payload of the form `{"games": [...]}`
    ///
    /// Elements that are not objects or have no `url` are dropped and
    /// counted. Fields of an unexpected type decode to their defaults.
    pub fn from_payload(year: i32, month: u32, payload: &Value) -> Self {
        let Some(elements) = payload.get("games").and_then(Value::as_array) else {
            tracing::warn!(year, month, "Archive payload has no games array");
            return Self::empty(year, month, FetchStatus::MalformedPayload);
        };

        let mut games = Vec::with_capacity(elements.len());
        let mut dropped = 0;

        for element in elements {
            match decode_game(element) {
                Some(game) => games.push(game),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::debug!(year, month, dropped, "Dropped malformed game records");
        }

        Self {
            year,
            month,
            games,
            dropped,
            status: FetchStatus::Ok,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }
}

fn decode_game(element: &Value) -> Option<Game> {
    let has_url = element
        .as_object()?
        .get("url")
        .and_then(Value::as_str)
        .map(|url| !url.is_empty())
        .unwrap_or(false);

    if !has_url {
        return None;
    }

    match serde_json::from_value::<Game>(element.clone()) {
        Ok(game) => Some(game),
        Err(e) => {
            tracing::debug!(error = %e, "Game record does not decode");
            None
        }
    }
}

/// Every `(year, month)` from `start`'s month through `end`'s month inclusive
pub fn months_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());
    let last = (end.year(), end.month());

    while (year, month) <= last {
        months.push((year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }

    months
}

/// Errors that can occur talking to a remote archive
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timeout")]
    Timeout,

    #[error("Archive unavailable")]
    Unavailable,

    #[error("API error {status}")]
    ApiError { status: u16 },

    #[error("Rate limited")]
    RateLimited,

    #[error("Parse error: {0}")]
    ParseError(String),
}
