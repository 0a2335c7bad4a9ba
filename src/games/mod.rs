//! Game records
//!
//! - **types**: `Game`, `Player`, `Selector` and the well-known codes
//! - **collection**: url-keyed collection that owns the mirrored games

pub mod collection;
pub mod types;

pub use collection::{GameCollection, Upsert};
pub use types::{normalize_nick, Game, Player, Selector, AUTO, RESULT_WIN, RULES_BUGHOUSE, RULES_CHESS};
