//! Analysis Engine
//!
//! Computes an [`Aggregate`] over one (time class, rules) slice of the
//! collection. Steps:
//! 1. Apply the concrete (non-`auto`) filters
//! 2. Sort survivors by `end_time`, ties keeping collection order
//! 3. Resolve each `auto` selector from the last game of that order
//! 4. Re-filter to the resolved pair and fold per-game facts in order
//!
//! Per-game facts are memoized in a [`FactCache`]; the collection itself is
//! only ever read.

use crate::analysis::aggregate::{Aggregate, PerGameFact};
use crate::analysis::memo::FactCache;
use crate::games::{Game, GameCollection, Selector, RESULT_WIN};
use crate::pgn;
use tokio::sync::Mutex;

/// Memoizing aggregator over a game collection
#[derive(Debug, Default)]
pub struct AnalysisEngine {
    memo: Mutex<FactCache>,
}

impl AnalysisEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics of `nick` over the selected slice of `games`
    pub async fn analyze(
        &self,
        games: &GameCollection,
        nick: &str,
        time_class: &Selector,
        rules: &Selector,
    ) -> Aggregate {
        let requested = || Aggregate::empty(time_class.label(), rules.label());

        if games.is_empty() {
            return requested();
        }

        let mut selected: Vec<&Game> = games
            .iter()
            .filter(|g| rules.matches(&g.rules) && time_class.matches(&g.time_class))
            .collect();

        // Stable, so equal end times keep collection order.
        selected.sort_by_key(|g| g.end_time);

        let Some(last) = selected.last() else {
            return requested();
        };

        let effective_time_class = resolve(time_class, &last.time_class);
        let effective_rules = resolve(rules, &last.rules);

        selected.retain(|g| g.time_class == effective_time_class && g.rules == effective_rules);

        let mut aggregate = Aggregate::empty(effective_time_class, effective_rules);
        let mut memo = self.memo.lock().await;

        for game in selected {
            let fact = match memo.get(&game.url, nick) {
                Some(fact) => fact,
                None => match compute_fact(game, nick) {
                    Some(fact) => {
                        memo.put(game, nick, fact);
                        fact
                    }
                    None => {
                        tracing::debug!(url = %game.url, nick, "Player not found in game, skipping");
                        continue;
                    }
                },
            };

            aggregate.push(fact);
        }

        aggregate
    }

    /// Drop memoized facts of `nick`, optionally scoped to a time class and/or rule set
    pub async fn invalidate(
        &self,
        nick: &str,
        time_class: Option<&str>,
        rules: Option<&str>,
    ) -> usize {
        self.memo.lock().await.invalidate(nick, time_class, rules)
    }

    /// Drop memoized facts of the given games, for every player
    pub async fn evict<'a>(&self, urls: impl IntoIterator<Item = &'a str>) -> usize {
        let mut memo = self.memo.lock().await;
        urls.into_iter().map(|url| memo.evict_url(url)).sum()
    }

    pub async fn clear(&self) {
        self.memo.lock().await.clear();
    }

    /// Number of memoized facts
    pub async fn cached_facts(&self) -> usize {
        self.memo.lock().await.len()
    }
}

fn resolve(selector: &Selector, last: &str) -> String {
    match selector {
        Selector::Auto => last.to_string(),
        Selector::Exact(value) => value.clone(),
    }
}

/// Facts of one game from `nick`'s side, `None` if `nick` did not play it
pub fn compute_fact(game: &Game, nick: &str) -> Option<PerGameFact> {
    let side = game.side_of(nick)?;

    let duration = if game.is_bughouse() {
        bughouse_duration(game)
    } else {
        pgn::extract_duration(&game.pgn)
    };

    Some(PerGameFact {
        rating: side.rating,
        win: u32::from(side.result == RESULT_WIN),
        draw: u32::from(game.is_draw()),
        duration,
    })
}

/// Bughouse headers carry no usable clock times; `time_control` holds the seconds
fn bughouse_duration(game: &Game) -> i64 {
    match game.time_control.trim().parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => seconds.round() as i64,
        _ => {
            tracing::warn!(
                url = %game.url,
                time_control = %game.time_control,
                "Bughouse time control is not a duration, using 0"
            );
            0
        }
    }
}
