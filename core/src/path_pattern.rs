//! `PathPattern` — URL path patterns and their specificity
//!
//! Three pattern shapes exist:
//!
//! | Rule text | Pattern | Matches |
//! |-----------|---------|---------|
//! | *(none)* | [`PathPattern::Global`] | every path |
//! | `/users` | [`PathPattern::Exact`] | `/users` only |
//! | `/api/*` | [`PathPattern::Prefix`] | `/api`, `/api/`, `/api/v1/...` (segment boundary) |
//!
//! Specificity is computed once at parse time and orders overlapping patterns:
//! exact > longer prefix > shorter prefix > global.

use crate::{ParseError, MAX_PATH_LENGTH};
use std::fmt;

/// Characters that may never appear in a path pattern.
const FORBIDDEN_PATH_CHARS: &[char] = &['?', '#', '[', ']', '&', ';', '!'];

/// Comparable rank of a [`PathPattern`]. Greater is more specific.
///
/// Derived ordering compares the variant first, then the prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Specificity {
    /// Rules without a path.
    Global,
    /// Prefix wildcard; the field is the literal prefix length in bytes.
    Prefix(usize),
    /// Exact literal path.
    Exact,
}

/// A compiled URL path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathPattern {
    /// Applies to every path.
    Global,
    /// Exact literal path.
    Exact(String),
    /// Literal prefix followed by `/*`. Stored without the trailing `/*`,
    /// so `/*` is `Prefix("")`.
    Prefix(String),
}

impl PathPattern {
    /// Compile a path pattern from rule text.
    ///
    /// # Errors
    ///
    /// - [`ParseError::SizeLimit`] if longer than [`MAX_PATH_LENGTH`]
    /// - [`ParseError::Syntax`] if the path does not start with `/`, has an
    ///   empty segment, contains forbidden characters, or uses `*` anywhere
    ///   but as the final segment
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Self::parse_at(text, 0)
    }

    pub(crate) fn parse_at(text: &str, offset: usize) -> Result<Self, ParseError> {
        if text.len() > MAX_PATH_LENGTH {
            return Err(ParseError::size_limit("path", text.len(), MAX_PATH_LENGTH));
        }
        if !text.starts_with('/') {
            return Err(ParseError::syntax(
                offset,
                format!("path \"{text}\" must start with '/'"),
            ));
        }
        if let Some((i, c)) = text
            .char_indices()
            .find(|&(_, c)| c.is_whitespace() || c.is_control() || FORBIDDEN_PATH_CHARS.contains(&c))
        {
            return Err(ParseError::syntax(
                offset + i,
                format!("character {c:?} is not allowed in path \"{text}\""),
            ));
        }
        if let Some(i) = text.find("//") {
            return Err(ParseError::syntax(
                offset + i,
                format!("path \"{text}\" contains an empty segment"),
            ));
        }

        let (literal, wildcard) = match text.strip_suffix("/*") {
            Some(literal) => (literal, true),
            None => (text, false),
        };
        if let Some(i) = literal.find('*') {
            return Err(ParseError::syntax(
                offset + i,
                format!("'*' is only allowed as the final path segment in \"{text}\""),
            ));
        }

        Ok(if wildcard {
            Self::Prefix(literal.to_owned())
        } else {
            Self::Exact(literal.to_owned())
        })
    }

    /// Returns the specificity rank of this pattern.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        match self {
            Self::Global => Specificity::Global,
            Self::Prefix(p) => Specificity::Prefix(p.len()),
            Self::Exact(_) => Specificity::Exact,
        }
    }

    /// Returns `true` if this pattern applies to `path`.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Global => true,
            Self::Exact(p) => p == path,
            Self::Prefix(p) => prefix_matches(p, path),
        }
    }
}

/// Segment-boundary prefix test: `/api` matches `/api` and `/api/...`, not `/apix`.
pub(crate) fn prefix_matches(prefix: &str, path: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Renders the rule-text form (`/api/*`, `/users`, or empty for global).
impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => Ok(()),
            Self::Exact(p) => f.write_str(p),
            Self::Prefix(p) => write!(f, "{p}/*"),
        }
    }
}
