//! Aggregate statistics types

use serde::{Deserialize, Serialize};

/// Derived outcome of one game from one player's perspective
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerGameFact {
    /// The player's rating recorded with the game
    pub rating: i64,
    /// 1 if the player won
    pub win: u32,
    /// 1 if both sides report the same outcome
    pub draw: u32,
    /// Elapsed seconds
    pub duration: i64,
}

/// One point of the rating curve
///
/// `x` is cumulative play time in seconds before the game, `y` the rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPoint {
    pub x: i64,
    pub y: i64,
}

/// Statistics over one (time class, rules) slice of the collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub win: u32,
    pub count: u32,
    pub draw: u32,
    /// Total play time in seconds
    pub duration: i64,
    pub graph_data: Vec<GraphPoint>,
    pub effective_time_class: String,
    pub effective_rules: String,
}

impl Aggregate {
    /// Zeroed aggregate carrying the given labels
    pub fn empty(time_class: impl Into<String>, rules: impl Into<String>) -> Self {
        Self {
            effective_time_class: time_class.into(),
            effective_rules: rules.into(),
            ..Default::default()
        }
    }

    /// Fold one game into the running totals
    pub fn push(&mut self, fact: PerGameFact) {
        self.graph_data.push(GraphPoint {
            x: self.duration,
            y: fact.rating,
        });
        self.win += fact.win;
        self.draw += fact.draw;
        self.duration += fact.duration;
        self.count += 1;
    }

    pub fn losses(&self) -> u32 {
        self.count.saturating_sub(self.win + self.draw)
    }

    /// Share of games won, 0.0 when empty
    pub fn win_rate(&self) -> f64 {
        ratio(self.win, self.count)
    }

    /// Share of games drawn, 0.0 when empty
    pub fn draw_rate(&self) -> f64 {
        ratio(self.draw, self.count)
    }

    /// Rating of the chronologically last game
    pub fn last_rating(&self) -> Option<i64> {
        self.graph_data.last().map(|p| p.y)
    }
}

fn ratio(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
