//! Evaluation trace types for debugging rule decisions.
//!
//! Trace types capture how a URL was judged instead of just the final bool.
//! Use [`Validator::explain_url`](crate::Validator::explain_url) to get full
//! visibility into which groups applied and which rule decided each parameter.
//!
//! # Example
//!
//! ```
//! let v = paramgate::Validator::new("/search?page=[1-10]").unwrap();
//! let trace = v.explain_url("/search?page=50&x=1");
//! assert!(!trace.valid);
//! for p in &trace.params {
//!     println!("{}={} -> {:?}", p.key, p.value, p.verdict);
//! }
//! ```

use std::fmt;

/// How one observed parameter was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Verdict {
    /// A rule named the parameter and its matcher accepted the value.
    Allowed,
    /// A `path?*` group accepted the parameter without a per-name rule.
    AllowedByWildcard,
    /// A rule named the parameter and its matcher rejected the value.
    Rejected,
    /// No applicable group named or wildcarded the parameter.
    Unknown,
}

impl Verdict {
    /// Returns `true` for the two allowing verdicts.
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed | Self::AllowedByWildcard)
    }
}

/// Trace of one query pair.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParamTrace {
    /// Decoded key.
    pub key: String,
    /// Decoded value.
    pub value: String,
    /// The segment as it appeared in the query string.
    pub raw: String,
    /// Decision for this pair.
    pub verdict: Verdict,
    /// Pattern of the deciding group (`""` for the global group).
    pub group: Option<String>,
    /// Rule text of the deciding matcher, e.g. `![1-10]`.
    pub matcher: Option<String>,
}

/// Trace of a full URL evaluation.
///
/// # INV: `valid` == `validate_url()` result
///
/// `valid` always equals what [`Validator::validate_url`](crate::Validator::validate_url)
/// returns for the same URL against the same snapshot, and `normalized`
/// equals [`Validator::normalize_url`](crate::Validator::normalize_url).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UrlTrace {
    /// The URL as given.
    pub url: String,
    /// Resolved path, `None` if the URL could not be tokenized.
    pub path: Option<String>,
    /// Whether any group applies to the path.
    pub known: bool,
    /// Applicable group patterns, most specific first.
    pub groups: Vec<String>,
    /// Every query pair in order.
    pub params: Vec<ParamTrace>,
    /// Final validation result.
    pub valid: bool,
    /// Normalized URL.
    pub normalized: String,
}

impl UrlTrace {
    pub(crate) fn untokenizable(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            path: None,
            known: false,
            groups: Vec::new(),
            params: Vec::new(),
            valid: false,
            normalized: String::new(),
        }
    }

    /// Pairs that were not allowed.
    pub fn rejected(&self) -> impl Iterator<Item = &ParamTrace> {
        self.params.iter().filter(|p| !p.verdict.is_allowed())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allowed => "allowed",
            Self::AllowedByWildcard => "allowed (wildcard)",
            Self::Rejected => "rejected",
            Self::Unknown => "unknown parameter",
        })
    }
}

/// Multi-line human-readable report.
impl fmt::Display for UrlTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "url: {}", self.url)?;
        let Some(path) = &self.path else {
            writeln!(f, "  untokenizable")?;
            return write!(f, "valid: false");
        };
        writeln!(f, "path: {path} ({})", if self.known { "known" } else { "unknown" })?;
        for group in &self.groups {
            let label = if group.is_empty() { "<global>" } else { group.as_str() };
            writeln!(f, "  group {label}")?;
        }
        for p in &self.params {
            write!(f, "  {} -> {}", p.raw, p.verdict)?;
            if let (Some(group), Some(matcher)) = (&p.group, &p.matcher) {
                let label = if group.is_empty() { "<global>" } else { group.as_str() };
                write!(f, " by {label} {}={matcher}", p.key)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "normalized: {}", self.normalized)?;
        write!(f, "valid: {}", self.valid)
    }
}
