//! `ParamMatcher` — Compiled constraint for a single query parameter
//!
//! A closed set of built-in variants plus one [`MatcherKind::Plugin`] variant
//! that carries a predicate compiled by a [`ConstraintPlugin`](crate::ConstraintPlugin).
//! Every matcher can be inverted; inversion is applied after the raw result,
//! uniformly for all variants.
//!
//! # Rule text → variant
//!
//! | Rule text | Variant |
//! |-----------|---------|
//! | `name` / `name=[*]` | [`MatcherKind::Any`] |
//! | `name=[]` | [`MatcherKind::KeyOnly`] |
//! | `name=[?]` | [`MatcherKind::Callback`] |
//! | `name=[1-10]` | [`MatcherKind::NumericRange`] |
//! | `name=[a,b,c]` | [`MatcherKind::Enum`] |
//! | `name=[<plugin text>]` | [`MatcherKind::Plugin`] |
//! | `name=![...]` | any of the above, inverted |

use crate::{ParseError, Predicate, MAX_NUMERIC_MAGNITUDE};
use std::fmt;
use std::sync::Arc;

/// Externally supplied decision function for `name=[?]` parameters.
///
/// Receives `(param_name, value)`.
pub type Callback = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// The raw (non-inverted) decision logic of a [`ParamMatcher`].
#[derive(Clone)]
pub enum MatcherKind {
    /// Byte-exact membership in an ordered, de-duplicated, non-empty set.
    Enum(Vec<String>),
    /// Value parses as `i64` within `min..=max`.
    NumericRange {
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },
    /// Parameter present with an empty value (`key` or `key=`).
    KeyOnly,
    /// Deferred to the validator's callback; `false` when none is configured.
    Callback,
    /// Any non-empty value.
    Any,
    /// Predicate compiled by a plugin.
    Plugin {
        /// Name of the plugin that compiled the predicate.
        plugin: String,
        /// The constraint text the predicate was compiled from.
        constraint: String,
        /// The compiled predicate.
        predicate: Predicate,
    },
}

impl fmt::Debug for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum(values) => f.debug_tuple("Enum").field(values).finish(),
            Self::NumericRange { min, max } => f
                .debug_struct("NumericRange")
                .field("min", min)
                .field("max", max)
                .finish(),
            Self::KeyOnly => f.write_str("KeyOnly"),
            Self::Callback => f.write_str("Callback"),
            Self::Any => f.write_str("Any"),
            Self::Plugin {
                plugin, constraint, ..
            } => f
                .debug_struct("Plugin")
                .field("plugin", plugin)
                .field("constraint", constraint)
                .finish_non_exhaustive(),
        }
    }
}

/// A compiled per-parameter constraint, optionally inverted.
///
/// # INV: Inversion law
///
/// For every matcher `m` and value `v`:
/// `m.inverted().evaluate(name, v, cb) == !m.evaluate(name, v, cb)`.
///
/// # Example
///
/// ```
/// use paramgate::ParamMatcher;
///
/// let page = ParamMatcher::range(1, 10).unwrap();
/// assert!(page.evaluate("page", "5", None));
/// assert!(!page.evaluate("page", "11", None));
/// assert!(!page.evaluate("page", "five", None));
///
/// let blocked = ParamMatcher::any().inverted();
/// assert!(blocked.evaluate("debug", "", None));
/// assert!(!blocked.evaluate("debug", "1", None));
/// ```
#[derive(Debug, Clone)]
pub struct ParamMatcher {
    kind: MatcherKind,
    inverted: bool,
}

impl ParamMatcher {
    /// Matcher for a literal value set.
    ///
    /// Duplicates are dropped, first occurrence order is kept.
    /// Returns `None` when `values` is empty.
    pub fn enumeration<I, S>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !set.contains(&value) {
                set.push(value);
            }
        }
        if set.is_empty() {
            return None;
        }
        Some(Self::from_kind(MatcherKind::Enum(set)))
    }

    /// Matcher for an inclusive integer range.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NumericRange`] when `min > max` or either bound
    /// exceeds [`MAX_NUMERIC_MAGNITUDE`].
    pub fn range(min: i64, max: i64) -> Result<Self, ParseError> {
        let text = format!("{min}-{max}");
        for bound in [min, max] {
            if bound.unsigned_abs() > MAX_NUMERIC_MAGNITUDE.unsigned_abs() {
                return Err(ParseError::numeric(
                    &text,
                    format!("{bound} exceeds the supported magnitude {MAX_NUMERIC_MAGNITUDE}"),
                ));
            }
        }
        if min > max {
            return Err(ParseError::numeric(
                &text,
                format!("lower bound {min} is greater than upper bound {max}"),
            ));
        }
        Ok(Self::from_kind(MatcherKind::NumericRange { min, max }))
    }

    /// Matcher requiring the parameter to carry no value.
    #[must_use]
    pub fn key_only() -> Self {
        Self::from_kind(MatcherKind::KeyOnly)
    }

    /// Matcher deferring to the validator's callback.
    #[must_use]
    pub fn callback() -> Self {
        Self::from_kind(MatcherKind::Callback)
    }

    /// Matcher accepting any non-empty value.
    #[must_use]
    pub fn any() -> Self {
        Self::from_kind(MatcherKind::Any)
    }

    /// Matcher backed by a plugin-compiled predicate.
    pub fn plugin(
        plugin: impl Into<String>,
        constraint: impl Into<String>,
        predicate: Predicate,
    ) -> Self {
        Self::from_kind(MatcherKind::Plugin {
            plugin: plugin.into(),
            constraint: constraint.into(),
            predicate,
        })
    }

    fn from_kind(kind: MatcherKind) -> Self {
        Self {
            kind,
            inverted: false,
        }
    }

    /// Flip the inversion flag.
    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.inverted = !self.inverted;
        self
    }

    /// Set the inversion flag explicitly.
    #[must_use]
    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// Returns `true` if the raw result is negated.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Returns the raw decision logic.
    #[must_use]
    pub fn kind(&self) -> &MatcherKind {
        &self.kind
    }

    /// Evaluate an observed value.
    ///
    /// Total for all inputs. `callback` is only consulted by
    /// [`MatcherKind::Callback`].
    pub fn evaluate(&self, param: &str, value: &str, callback: Option<&Callback>) -> bool {
        self.raw(param, value, callback) ^ self.inverted
    }

    fn raw(&self, param: &str, value: &str, callback: Option<&Callback>) -> bool {
        match &self.kind {
            MatcherKind::Enum(values) => values.iter().any(|v| v == value),
            MatcherKind::NumericRange { min, max } => value
                .parse::<i64>()
                .is_ok_and(|n| (*min..=*max).contains(&n)),
            MatcherKind::KeyOnly => value.is_empty(),
            MatcherKind::Callback => callback.is_some_and(|cb| cb(param, value)),
            MatcherKind::Any => !value.is_empty(),
            MatcherKind::Plugin { predicate, .. } => predicate(value),
        }
    }
}

/// Renders the bracketed rule-text form, e.g. `![1-10]` or `[name,date]`.
impl fmt::Display for ParamMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverted {
            f.write_str("!")?;
        }
        match &self.kind {
            MatcherKind::Enum(values) => write!(f, "[{}]", values.join(",")),
            MatcherKind::NumericRange { min, max } => write!(f, "[{min}-{max}]"),
            MatcherKind::KeyOnly => f.write_str("[]"),
            MatcherKind::Callback => f.write_str("[?]"),
            MatcherKind::Any => f.write_str("[*]"),
            MatcherKind::Plugin { constraint, .. } => write!(f, "[{constraint}]"),
        }
    }
}
