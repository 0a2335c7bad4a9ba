//! PGN error types

use thiserror::Error;

/// Errors that can occur while reading PGN header tags
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PgnError {
    /// A header line is not a well-formed `[Name "value"]` tag
    #[error("Malformed header tag: {0}")]
    TagSyntax(String),

    /// A tag required for the computation is absent
    #[error("Missing header tag: {0}")]
    MissingTag(&'static str),

    /// A date/time pair did not form a valid instant
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The game ends before it starts
    #[error("Negative duration: {0}s")]
    NegativeDuration(i64),
}

/// Result type alias for PGN operations
pub type PgnResult<T> = Result<T, PgnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PgnError::MissingTag("EndTime");
        assert_eq!(err.to_string(), "Missing header tag: EndTime");

        let err = PgnError::NegativeDuration(-5);
        assert_eq!(err.to_string(), "Negative duration: -5s");
    }
}
