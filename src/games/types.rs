//! Core data types for mirrored games
//!
//! This module defines the records the rest of the crate passes around:
//! - `Game`: one finished game as published by the remote archive
//! - `Player`: one side of a game
//! - `Selector`: a filter value that may be the `auto` sentinel

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Rule set of standard chess
pub const RULES_CHESS: &str = "chess";

/// Rule set whose duration comes from `time_control` instead of the PGN
pub const RULES_BUGHOUSE: &str = "bughouse";

/// Result code a side reports when it won
pub const RESULT_WIN: &str = "win";

/// Text form of [`Selector::Auto`]
pub const AUTO: &str = "auto";

/// One side of a game
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Player {
    #[serde(default, deserialize_with = "lenient_string")]
    pub username: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub rating: i64,
    /// Outcome code from this side's perspective (`win`, `checkmated`, `agreed`, ...)
    #[serde(default, deserialize_with = "lenient_string")]
    pub result: String,
    /// Remaining fields of the remote player record (`@id`, `uuid`, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Player {
    pub fn new(username: impl Into<String>, rating: i64, result: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            rating,
            result: result.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Case-insensitive username comparison, see [`normalize_nick`]
    pub fn is(&self, nick: &str) -> bool {
        normalize_nick(&self.username) == normalize_nick(nick)
    }
}

/// Canonical form of a player name for lookups and cache keys
pub fn normalize_nick(nick: &str) -> String {
    nick.to_lowercase()
}

/// A finished game
///
/// Identified by `url`. Stored games are never edited field by field: a
/// changed record replaces the stored one wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pgn: String,
    /// Unix timestamp in seconds
    #[serde(default, deserialize_with = "lenient_i64")]
    pub end_time: i64,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub rated: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time_class: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub rules: String,
    /// Base+increment text for most rule sets, plain seconds for bughouse
    #[serde(default, deserialize_with = "lenient_string")]
    pub time_control: String,
    #[serde(default, deserialize_with = "lenient_player")]
    pub white: Player,
    #[serde(default, deserialize_with = "lenient_player")]
    pub black: Player,
    /// Remaining fields of the remote record, kept so they take part in change detection
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Game {
    /// Create a rated standard-chess game
    pub fn new(url: impl Into<String>, end_time: i64, white: Player, black: Player) -> Self {
        Self {
            url: url.into(),
            pgn: String::new(),
            end_time,
            rated: true,
            time_class: String::new(),
            rules: RULES_CHESS.to_string(),
            time_control: String::new(),
            white,
            black,
            extra: BTreeMap::new(),
        }
    }

    /// Builder method: set time class
    pub fn time_class(mut self, time_class: impl Into<String>) -> Self {
        self.time_class = time_class.into();
        self
    }

    /// Builder method: set rule set
    pub fn rules(mut self, rules: impl Into<String>) -> Self {
        self.rules = rules.into();
        self
    }

    /// Builder method: set PGN text
    pub fn pgn(mut self, pgn: impl Into<String>) -> Self {
        self.pgn = pgn.into();
        self
    }

    /// Builder method: set time control
    pub fn time_control(mut self, time_control: impl Into<String>) -> Self {
        self.time_control = time_control.into();
        self
    }

    /// Builder method: set rated flag
    pub fn rated(mut self, rated: bool) -> Self {
        self.rated = rated;
        self
    }

    pub fn is_bughouse(&self) -> bool {
        self.rules == RULES_BUGHOUSE
    }

    /// The side played by `nick`, if any
    pub fn side_of(&self, nick: &str) -> Option<&Player> {
        if self.white.is(nick) {
            Some(&self.white)
        } else if self.black.is(nick) {
            Some(&self.black)
        } else {
            None
        }
    }

    /// Both sides report the same outcome code
    pub fn is_draw(&self) -> bool {
        self.white.result == self.black.result
    }

    /// Canonical serialization used to detect content changes between fetches
    pub fn snapshot(&self) -> String {
        // Field order is fixed by the struct and `extra` is sorted, so equal
        // content always yields equal text.
        serde_json::to_string(self).unwrap_or_default()
    }
}

// Archive records are loosely typed. A field of an unexpected type decodes
// to its default instead of rejecting the whole record.

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse::<f64>().map(|f| f.round() as i64).unwrap_or_default(),
        _ => 0,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

fn lenient_player<'de, D>(deserializer: D) -> Result<Player, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(Player::default()),
    }
}

/// A filter value that is either a concrete label or the `auto` sentinel
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Resolve from the chronologically last matching game
    #[default]
    Auto,
    Exact(String),
}

impl Selector {
    pub fn exact(value: impl Into<String>) -> Self {
        Selector::Exact(value.into())
    }

    /// Whether `value` passes this filter (`Auto` passes everything)
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selector::Auto => true,
            Selector::Exact(v) => v == value,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Selector::Auto => AUTO,
            Selector::Exact(v) => v,
        }
    }
}

impl FromStr for Selector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(AUTO) {
            Ok(Selector::Auto)
        } else {
            Ok(Selector::Exact(s.to_string()))
        }
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(selector) => selector,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> Value {
        serde_json::json!({
            "url": "https://www.chess.com/game/live/1",
            "pgn": "[Event \"Live Chess\"]",
            "time_control": "180+2",
            "end_time": 1704103530,
            "rated": true,
            "tcn": "mC0Kgv",
            "uuid": "abc",
            "fen": "8/8/8/8/8/8/8/8 w - -",
            "time_class": "blitz",
            "rules": "chess",
            "white": { "rating": 1500, "result": "win", "@id": "x", "username": "Alice", "uuid": "u1" },
            "black": { "rating": 1480, "result": "resigned", "@id": "y", "username": "bob", "uuid": "u2" }
        })
    }

    #[test]
    fn test_game_deserialization() {
        let game: Game = serde_json::from_value(sample_json()).unwrap();

        assert_eq!(game.url, "https://www.chess.com/game/live/1");
        assert_eq!(game.time_control, "180+2");
        assert_eq!(game.white.rating, 1500);
        assert_eq!(game.extra.get("fen").and_then(Value::as_str), Some("8/8/8/8/8/8/8/8 w - -"));
        assert!(game.extra.contains_key("tcn"));
    }

    #[test]
    fn test_numeric_time_control() {
        let mut json = sample_json();
        json["time_control"] = serde_json::json!(600);
        json["rules"] = serde_json::json!("bughouse");

        let game: Game = serde_json::from_value(json).unwrap();
        assert_eq!(game.time_control, "600");
        assert!(game.is_bughouse());
    }

    #[test]
    fn test_side_lookup_is_case_insensitive() {
        let game: Game = serde_json::from_value(sample_json()).unwrap();

        assert_eq!(game.side_of("alice").map(|p| p.rating), Some(1500));
        assert_eq!(game.side_of("BOB").map(|p| p.rating), Some(1480));
        assert!(game.side_of("carol").is_none());
        assert!(!game.is_draw());
    }

    #[test]
    fn test_snapshot_tracks_extra_fields() {
        let a: Game = serde_json::from_value(sample_json()).unwrap();
        let mut b = a.clone();
        assert_eq!(a.snapshot(), b.snapshot());

        b.extra.insert("fen".into(), Value::String("changed".into()));
        assert_ne!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_loosely_typed_fields_decode_to_defaults() {
        let json = serde_json::json!({
            "url": "https://www.chess.com/game/live/2",
            "pgn": null,
            "end_time": 1704103530.0,
            "rated": null,
            "time_control": true,
            "white": { "username": "alice", "rating": 1500.4, "result": "win" },
            "black": null
        });

        let game: Game = serde_json::from_value(json).unwrap();
        assert_eq!(game.pgn, "");
        assert_eq!(game.end_time, 1704103530);
        assert!(!game.rated);
        assert_eq!(game.time_control, "true");
        assert_eq!(game.white.rating, 1500);
        assert_eq!(game.black, Player::default());
    }

    #[test]
    fn test_player_extra_fields_are_mirrored() {
        let a: Game = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(a.white.extra.get("uuid").and_then(Value::as_str), Some("u1"));
        assert!(a.white.extra.contains_key("@id"));

        let mut b = a.clone();
        b.white.extra.insert("uuid".into(), Value::String("u9".into()));
        assert_ne!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_side_lookup_handles_non_ascii_names() {
        let game = Game::new(
            "g",
            0,
            Player::new("Élodie", 1600, "win"),
            Player::new("Øyvind", 1550, "resigned"),
        );

        assert_eq!(game.side_of("ÉLODIE").map(|p| p.rating), Some(1600));
        assert_eq!(game.side_of("øyvind").map(|p| p.rating), Some(1550));
        assert_eq!(normalize_nick("ÉLODIE"), normalize_nick("élodie"));
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!(Selector::from("auto"), Selector::Auto);
        assert_eq!(Selector::from("AUTO"), Selector::Auto);
        assert_eq!(Selector::from(""), Selector::Auto);
        assert_eq!(Selector::from("blitz"), Selector::exact("blitz"));
        assert_eq!(Selector::Auto.to_string(), "auto");
        assert!(Selector::Auto.matches("rapid"));
        assert!(!Selector::exact("blitz").matches("rapid"));
    }
}
