//! paramgate - Query-parameter policy engine
//!
//! Compiles a compact rule language describing which query parameters are
//! permitted on which URL paths into an immutable [`RuleSet`], and answers
//! validation, filtering and normalization queries against it.
//!
//! # Architecture
//!
//! ```text
//! rule text ──parse_rules()──► RuleSet ──publish──► RuleStore (ArcSwap)
//!                 │                                     │
//!          ConstraintPlugin chain                 load() snapshot
//!          + ValidatorCache                             │
//!                                    request URL ──► RuleSet::resolve ──► ParamMatcher
//! ```
//!
//! - [`ParamMatcher`] — Compiled per-parameter constraint (enum, range, key-only, ...)
//! - [`ConstraintPlugin`] — Extension seam for custom constraint syntaxes
//! - [`RuleSet`] — Immutable snapshot of global and per-path rule groups
//! - [`RuleStore`] — Atomically swappable holder of the active `RuleSet`
//! - [`Validator`] — The public API composing all of the above
//!
//! # Key Design Insights
//!
//! 1. **Snapshots, never mutation**: a published `RuleSet` is never changed.
//!    Writers build a new one off to the side and swap it in with one atomic store.
//!
//! 2. **First claim wins**: plugins are consulted in registration order and the
//!    first plugin whose `can_handle` accepts a constraint owns it, errors included.
//!
//! 3. **Evaluation is total**: validating attacker-supplied input never fails and
//!    never panics. Anything that cannot be understood is simply not permitted.
//!
//! # Example
//!
//! ```
//! use paramgate::Validator;
//!
//! let validator = Validator::new("/search?page=[1-10]&sort=[name,date]").unwrap();
//!
//! assert!(validator.validate_url("/search?page=5&sort=name"));
//! assert!(!validator.validate_url("/search?page=50"));
//! assert_eq!(
//!     validator.normalize_url("/search?page=5&sort=name&utm_source=mail"),
//!     "/search?page=5&sort=name"
//! );
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod cache;
mod param_matcher;
mod parser;
mod path_pattern;
mod plugin;
mod prefix_tree;
mod query;
mod rule_set;
mod store;
mod trace;
mod validator;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

pub use cache::{CacheKey, ValidatorCache};
pub use param_matcher::{Callback, MatcherKind, ParamMatcher};
pub use parser::{check_rules, check_rules_with_plugins, parse_rules, Parser};
pub use path_pattern::{PathPattern, Specificity};
pub use plugin::{ConstraintPlugin, PluginError, Predicate};
pub use query::{query_pairs, split_url, QueryPair, SplitUrl};
pub use rule_set::{Lookup, ParamRule, Resolution, RuleSet, RuleSetBuilder, UrlRuleGroup};
pub use store::RuleStore;
pub use trace::{ParamTrace, UrlTrace, Verdict};
pub use validator::{Validator, ValidatorBuilder};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use paramgate::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Parsing
        check_rules,
        parse_rules,
        // Plugin seam
        Callback,
        ConstraintPlugin,
        // Matchers
        MatcherKind,
        ParamMatcher,
        ParamRule,
        // Errors
        ParseError,
        Parser,
        PathPattern,
        PluginError,
        Predicate,
        // Rules
        RuleSet,
        UrlRuleGroup,
        // Trace types
        UrlTrace,
        // API
        Validator,
        ValidatorBuilder,
        Verdict,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum accepted length of a complete rule text, in bytes.
///
/// Checked before any parsing work so oversized input costs O(1) to reject.
pub const MAX_RULES_LENGTH: usize = 64 * 1024;

/// Maximum number of non-empty rule groups in one rule text.
pub const MAX_RULE_GROUPS: usize = 4096;

/// Maximum length of a path pattern in a rule group.
pub const MAX_PATH_LENGTH: usize = 1024;

/// Maximum length of a parameter name.
pub const MAX_PARAM_NAME_LENGTH: usize = 256;

/// Maximum length of a bracketed constraint body.
pub const MAX_CONSTRAINT_LENGTH: usize = 4096;

/// Maximum number of literals in an enum constraint.
pub const MAX_ENUM_VALUES: usize = 1024;

/// Largest magnitude accepted for any numeric literal in rule text.
///
/// Keeps one bit of headroom below `i64::MAX` so bound arithmetic in
/// plugins can never overflow.
pub const MAX_NUMERIC_MAGNITUDE: i64 = (1 << 62) - 1;

/// Maximum length of a request URL or query string accepted for evaluation.
///
/// Longer input is treated as untokenizable and therefore not permitted.
pub const MAX_URL_LENGTH: usize = 64 * 1024;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from compiling rule text.
///
/// These are raised at parse time only. Evaluation never fails: a value that
/// cannot be understood is simply not permitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Malformed rule text (unbalanced brackets, empty name, bad path, ...).
    #[error("syntax error at byte {position}: {message}")]
    Syntax {
        /// Byte offset into the rule text where the problem was detected.
        position: usize,
        /// What went wrong.
        message: String,
    },

    /// Rule text or one of its parts exceeds a configured maximum.
    #[error("{what} length is {len}, but maximum allowed is {max}")]
    SizeLimit {
        /// Which part of the rule text was too large.
        what: &'static str,
        /// Actual size.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// A numeric literal is outside the supported window, or a range is inverted.
    #[error("numeric constraint \"{constraint}\" is invalid: {message}")]
    NumericRange {
        /// The offending constraint text.
        constraint: String,
        /// What went wrong.
        message: String,
    },

    /// A plugin claimed a constraint but could not compile it.
    #[error("plugin \"{plugin}\" rejected constraint \"{constraint}\" for parameter \"{param}\": {source}")]
    Plugin {
        /// Name of the plugin that claimed the constraint.
        plugin: String,
        /// Parameter the constraint belongs to.
        param: String,
        /// The constraint text as written.
        constraint: String,
        /// The plugin's own error.
        #[source]
        source: PluginError,
    },
}

impl ParseError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn size_limit(what: &'static str, len: usize, max: usize) -> Self {
        Self::SizeLimit { what, len, max }
    }

    pub(crate) fn numeric(constraint: &str, message: impl Into<String>) -> Self {
        Self::NumericRange {
            constraint: constraint.to_owned(),
            message: message.into(),
        }
    }
}
