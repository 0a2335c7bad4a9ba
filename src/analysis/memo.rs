//! Per-game fact cache
//!
//! Facts are keyed by `(url, nick)` with the nick normalized by
//! [`normalize_nick`]. A fact does not depend on the filter that selected
//! its game, so one entry serves every (time class, rules) slice. Entries
//! remember their game's time class and rules only so that invalidation can
//! be scoped by them.

use crate::analysis::aggregate::PerGameFact;
use crate::games::{normalize_nick, Game};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct CachedFact {
    fact: PerGameFact,
    time_class: String,
    rules: String,
}

/// Memoized per-game facts, url → nick → fact
#[derive(Debug, Default)]
pub struct FactCache {
    entries: HashMap<String, HashMap<String, CachedFact>>,
}

impl FactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str, nick: &str) -> Option<PerGameFact> {
        self.entries
            .get(url)?
            .get(&normalize_nick(nick))
            .map(|cached| cached.fact)
    }

    pub fn put(&mut self, game: &Game, nick: &str, fact: PerGameFact) {
        self.entries.entry(game.url.clone()).or_default().insert(
            normalize_nick(nick),
            CachedFact {
                fact,
                time_class: game.time_class.clone(),
                rules: game.rules.clone(),
            },
        );
    }

    /// Remove the facts of `nick`, optionally only those of one time class and/or rule set
    ///
    /// Returns the number of removed entries.
    pub fn invalidate(&mut self, nick: &str, time_class: Option<&str>, rules: Option<&str>) -> usize {
        let nick = normalize_nick(nick);
        let mut removed = 0;

        self.entries.retain(|_, by_nick| {
            let matches = by_nick.get(&nick).map_or(false, |cached| {
                time_class.map_or(true, |tc| cached.time_class == tc)
                    && rules.map_or(true, |r| cached.rules == r)
            });
            if matches {
                by_nick.remove(&nick);
                removed += 1;
            }
            !by_nick.is_empty()
        });

        removed
    }

    /// Remove every fact about one game, for all players
    pub fn evict_url(&mut self, url: &str) -> usize {
        self.entries.remove(url).map_or(0, |by_nick| by_nick.len())
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
