//! Path pattern matching.
//!
//! # Responsibilities
//! - Compile `/api/posts/:id/like` style patterns into segments
//! - Match a concrete path against a compiled pattern
//! - Bind parameter segments by name
//!
//! # Design Decisions
//! - Segment counts must be equal; no wildcards, optional segments or regex
//! - Literal segments compare byte-for-byte (case-sensitive)
//! - Parameter values are bound raw; percent-encoding is left untouched
//! - A non-match is a normal return value, never an error

use std::collections::HashMap;

use thiserror::Error;

const DELIMITER: char = '/';
const PARAM_SIGIL: char = ':';

/// Parameter bindings produced by a successful match.
pub type RouteParams = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    NoMatch,
    Matched(RouteParams),
}

/// Error type for pattern compilation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("pattern `{0}` must start with '/'")]
    MissingLeadingSlash(String),

    #[error("pattern `{0}` has a parameter without a name")]
    EmptyParam(String),

    #[error("pattern `{pattern}` binds `{name}` more than once")]
    DuplicateParam { pattern: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        if !raw.starts_with(DELIMITER) {
            return Err(RouteError::MissingLeadingSlash(raw.to_string()));
        }

        let mut segments = Vec::new();
        let mut names: Vec<&str> = Vec::new();
        for part in raw.split(DELIMITER) {
            match part.strip_prefix(PARAM_SIGIL) {
                Some("") => return Err(RouteError::EmptyParam(raw.to_string())),
                Some(name) => {
                    if names.contains(&name) {
                        return Err(RouteError::DuplicateParam {
                            pattern: raw.to_string(),
                            name: name.to_string(),
                        });
                    }
                    names.push(name);
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when every path matching `other` would already match `self`.
    ///
    /// Used at freeze time to flag routes that can never be reached.
    pub fn shadows(&self, other: &Pattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Param(_), _) => true,
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Literal(_), Segment::Param(_)) => false,
                })
    }
}

/// Match `path` against `pattern`.
pub fn match_path(pattern: &Pattern, path: &str) -> MatchResult {
    if path.split(DELIMITER).count() != pattern.segments.len() {
        return MatchResult::NoMatch;
    }

    let mut params = RouteParams::new();
    for (segment, actual) in pattern.segments.iter().zip(path.split(DELIMITER)) {
        match segment {
            Segment::Literal(expected) if expected != actual => return MatchResult::NoMatch,
            Segment::Literal(_) => {}
            Segment::Param(name) => {
                params.insert(name.clone(), actual.to_string());
            }
        }
    }

    MatchResult::Matched(params)
}
