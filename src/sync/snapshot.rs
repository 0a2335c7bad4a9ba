//! Change-detection snapshots
//!
//! Maps a game url to the canonical serialization of the last record seen
//! for it. Only used to answer "did this record change since last fetch?".

use crate::games::Game;
use std::collections::HashMap;

/// Last-seen canonical form of every fetched game
#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    snapshots: HashMap<String, String>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `game` as last seen
    pub fn record(&mut self, game: &Game) {
        self.snapshots.insert(game.url.clone(), game.snapshot());
    }

    /// Whether `game` differs from the last-seen record with the same url
    ///
    /// A url never seen before counts as changed.
    pub fn is_changed(&self, game: &Game) -> bool {
        self.snapshots
            .get(&game.url)
            .map(|stored| *stored != game.snapshot())
            .unwrap_or(true)
    }

    pub fn get(&self, url: &str) -> Option<&str> {
        self.snapshots.get(url).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::Player;

    fn game(result: &str) -> Game {
        Game::new("g1", 100, Player::new("alice", 1500, result), Player::new("bob", 1500, "win"))
    }

    #[test]
    fn test_unseen_game_is_changed() {
        let cache = SnapshotCache::new();
        assert!(cache.is_changed(&game("resigned")));
    }

    #[test]
    fn test_record_and_compare() {
        let mut cache = SnapshotCache::new();
        cache.record(&game("resigned"));

        assert!(!cache.is_changed(&game("resigned")));
        assert!(cache.is_changed(&game("timeout")));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("g1"), Some(game("resigned").snapshot().as_str()));
    }
}
