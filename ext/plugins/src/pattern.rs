//! Glob patterns: `*` matches any run of characters, `?` exactly one.
//!
//! Each glob is pre-split on `*` into literal segments at compile time.
//! Matching anchors the first and last segments and finds the middle ones
//! left to right, never revisiting an earlier choice, so the cost is bounded
//! by `value length × pattern length` with no backtracking.

use paramgate::{ConstraintPlugin, PluginError, Predicate, MAX_ENUM_VALUES};
use std::sync::Arc;

/// Maximum length of a single glob, in characters.
pub const MAX_GLOB_PATTERN_LENGTH: usize = 256;

/// Matches values against comma-separated globs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternPlugin;

impl ConstraintPlugin for PatternPlugin {
    fn name(&self) -> &str {
        "pattern"
    }

    fn can_handle(&self, constraint: &str) -> bool {
        constraint.contains(['*', '?'])
            && constraint.chars().any(|c| c != '*' && c != '?')
    }

    fn compile(&self, _param: &str, constraint: &str) -> Result<Predicate, PluginError> {
        let globs = constraint
            .split(',')
            .filter(|g| !g.is_empty())
            .map(Glob::compile)
            .collect::<Result<Vec<_>, _>>()?;
        if globs.is_empty() {
            return Err(PluginError::new("no patterns"));
        }
        if globs.len() > MAX_ENUM_VALUES {
            return Err(PluginError::new(format!(
                "{} patterns, but maximum allowed is {MAX_ENUM_VALUES}",
                globs.len()
            )));
        }

        Ok(Arc::new(move |value: &str| {
            let chars: Vec<char> = value.chars().collect();
            globs.iter().any(|g| g.matches(&chars))
        }))
    }
}

/// `None` is `?`.
type Segment = Vec<Option<char>>;

/// A compiled glob: literal segments that were separated by `*`.
#[derive(Debug, Clone)]
struct Glob {
    segments: Vec<Segment>,
}

impl Glob {
    fn compile(text: &str) -> Result<Self, PluginError> {
        let len = text.chars().count();
        if len > MAX_GLOB_PATTERN_LENGTH {
            return Err(PluginError::new(format!(
                "pattern length is {len}, but maximum allowed is {MAX_GLOB_PATTERN_LENGTH}"
            )));
        }
        let segments = text
            .split('*')
            .map(|s| s.chars().map(|c| (c != '?').then_some(c)).collect())
            .collect();
        Ok(Self { segments })
    }

    fn matches(&self, value: &[char]) -> bool {
        let [first, middle @ .., last] = self.segments.as_slice() else {
            // no '*': one segment must cover the whole value
            return self
                .segments
                .first()
                .is_some_and(|s| s.len() == value.len() && segment_at(s, value, 0));
        };
        if value.len() < first.len() + last.len() {
            return false;
        }
        let end = value.len() - last.len();
        if !segment_at(first, value, 0) || !segment_at(last, value, end) {
            return false;
        }

        let mut pos = first.len();
        for segment in middle.iter().filter(|s| !s.is_empty()) {
            let Some(found) = (pos..=end.saturating_sub(segment.len()))
                .take_while(|&i| i + segment.len() <= end)
                .find(|&i| segment_at(segment, value, i))
            else {
                return false;
            };
            pos = found + segment.len();
        }
        true
    }
}

fn segment_at(segment: &[Option<char>], value: &[char], at: usize) -> bool {
    value.get(at..at + segment.len()).is_some_and(|window| {
        window
            .iter()
            .zip(segment)
            .all(|(v, s)| s.map_or(true, |c| c == *v))
    })
}
