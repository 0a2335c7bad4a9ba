//! PGN header tag parser
//!
//! Reads the `[Name "value"]` tag section of a PGN game. Only lines that
//! open a tag are looked at, so move text after the header never reaches
//! the parser.
//!
//! # Example
//!
//! ```text
//! [Event "Live Chess"]
//! [UTCDate "2024.01.01"]
//! [StartTime "10:00:00"]
//!
//! 1. e4 e5 2. Nf3 ...
//! ```

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt, value},
    sequence::delimited,
    IResult,
};

use crate::pgn::error::{PgnError, PgnResult};

/// Header tags in document order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderTags {
    tags: Vec<(String, String)>,
}

impl HeaderTags {
    /// Value of the first tag called `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a tag that must be present
    pub fn require(&self, name: &'static str) -> PgnResult<&str> {
        self.get(name).ok_or(PgnError::MissingTag(name))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Parse every header tag line of a PGN text
pub fn parse_tags(pgn: &str) -> PgnResult<HeaderTags> {
    let mut tags = Vec::new();

    for line in pgn.lines().map(str::trim).filter(|l| l.starts_with('[')) {
        match parse_tag(line) {
            Ok((remaining, (name, value))) if remaining.trim().is_empty() => {
                tags.push((name.to_string(), value));
            }
            Ok((remaining, _)) => {
                return Err(PgnError::TagSyntax(format!(
                    "unexpected input after tag: '{}'",
                    remaining.trim()
                )));
            }
            Err(e) => return Err(PgnError::TagSyntax(format!("{:?}", e))),
        }
    }

    Ok(HeaderTags { tags })
}

/// Parse a single `[Name "value"]` tag
fn parse_tag(input: &str) -> IResult<&str, (&str, String)> {
    let (input, _) = char('[')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, name) = parse_tag_name(input)?;
    let (input, _) = multispace0(input)?;
    let (input, value) = parse_quoted(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(']')(input)?;

    Ok((input, (name, value)))
}

fn parse_tag_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

/// Parse a double-quoted string with `\"` and `\\` escapes
fn parse_quoted(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        map(
            opt(escaped_transform(
                is_not("\\\""),
                '\\',
                alt((value("\\", tag("\\")), value("\"", tag("\"")))),
            )),
            Option::unwrap_or_default,
        ),
        char('"'),
    )(input)
}
