//! PGN Header Reading
//!
//! - **tags**: nom parser for the `[Name "value"]` header section
//! - **duration**: elapsed game time from the start/end date and time tags
//! - **error**: Error types

pub mod duration;
pub mod error;
pub mod tags;

pub use duration::{extract as extract_duration, try_extract as try_extract_duration};
pub use error::{PgnError, PgnResult};
pub use tags::{parse_tags, HeaderTags};
