//! Game collection keyed by url
//!
//! Holds games in insertion order with a url lookup table, the same
//! layout as a registry: a `Vec` for iteration plus a `HashMap` index.

use crate::games::types::Game;
use std::collections::HashMap;

/// Outcome of [`GameCollection::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Mapping from url to game with no duplicate keys
#[derive(Debug, Clone, Default)]
pub struct GameCollection {
    games: Vec<Game>,
    by_url: HashMap<String, usize>,
}

impl GameCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection, later records replacing earlier ones with the same url
    pub fn from_games(games: impl IntoIterator<Item = Game>) -> Self {
        let mut collection = Self::new();
        for game in games {
            collection.upsert(game);
        }
        collection
    }

    /// Insert a new game or replace the stored one in place
    pub fn upsert(&mut self, game: Game) -> Upsert {
        match self.by_url.get(&game.url) {
            Some(&idx) => {
                self.games[idx] = game;
                Upsert::Replaced
            }
            None => {
                self.by_url.insert(game.url.clone(), self.games.len());
                self.games.push(game);
                Upsert::Inserted
            }
        }
    }

    pub fn get(&self, url: &str) -> Option<&Game> {
        self.by_url.get(url).map(|&idx| &self.games[idx])
    }

    pub fn contains(&self, url: &str) -> bool {
        self.by_url.contains_key(url)
    }

    /// Games in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Game> {
        self.games.iter()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn clear(&mut self) {
        self.games.clear();
        self.by_url.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::types::Player;

    fn game(url: &str, end_time: i64) -> Game {
        Game::new(url, end_time, Player::new("a", 1500, "win"), Player::new("b", 1500, "resigned"))
    }

    #[test]
    fn test_upsert_dedups_by_url() {
        let mut collection = GameCollection::new();

        assert_eq!(collection.upsert(game("g1", 10)), Upsert::Inserted);
        assert_eq!(collection.upsert(game("g2", 20)), Upsert::Inserted);
        assert_eq!(collection.upsert(game("g1", 30)), Upsert::Replaced);

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get("g1").map(|g| g.end_time), Some(30));
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut collection = GameCollection::from_games(vec![game("g1", 10), game("g2", 20)]);
        collection.upsert(game("g1", 99));

        let urls: Vec<&str> = collection.iter().map(|g| g.url.as_str()).collect();
        assert_eq!(urls, vec!["g1", "g2"]);
    }

    #[test]
    fn test_clear() {
        let mut collection = GameCollection::from_games(vec![game("g1", 10)]);
        collection.clear();

        assert!(collection.is_empty());
        assert!(!collection.contains("g1"));
    }
}
