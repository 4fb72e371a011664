//! `ConstraintPlugin` — Extension seam for custom constraint syntaxes
//!
//! A plugin teaches the parser a new constraint language for the text inside
//! `name=[...]`. The parser offers each constraint body to the registered
//! plugins in order; the first plugin whose [`can_handle`](ConstraintPlugin::can_handle)
//! returns `true` owns that body exclusively.
//!
//! # Dispatch chain
//!
//! ```text
//! body ──► plugin[0].can_handle? ──yes──► plugin[0].compile ──► Ok(predicate) | Err(hard error)
//!              │ no
//!              ▼
//!          plugin[1].can_handle? ...
//!              │ no
//!              ▼
//!          built-in fallback (numeric range, else enum)
//! ```
//!
//! A failed `compile` is final. The parser never retries the body with the
//! next plugin or the enum fallback.

use std::fmt::Debug;
use std::sync::Arc;

/// A compiled value predicate produced by a plugin.
///
/// Must be total (never panic) and run in time bounded by the value length,
/// since it is evaluated against untrusted request data.
pub type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Error returned by [`ConstraintPlugin::compile`].
///
/// The parser wraps it into [`ParseError::Plugin`](crate::ParseError::Plugin)
/// together with the plugin name, parameter name and constraint text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PluginError {
    message: String,
}

impl PluginError {
    /// Create a plugin error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A pluggable constraint-syntax handler.
///
/// # Thread Safety
///
/// Plugins are shared across threads by every validator that registers them,
/// so implementations must be `Send + Sync`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use paramgate::{ConstraintPlugin, PluginError, Predicate};
///
/// /// Accepts `even` / `odd`.
/// #[derive(Debug)]
/// struct ParityPlugin;
///
/// impl ConstraintPlugin for ParityPlugin {
///     fn name(&self) -> &str {
///         "parity"
///     }
///
///     fn can_handle(&self, constraint: &str) -> bool {
///         constraint == "even" || constraint == "odd"
///     }
///
///     fn compile(&self, _param: &str, constraint: &str) -> Result<Predicate, PluginError> {
///         let want = if constraint == "even" { 0 } else { 1 };
///         Ok(Arc::new(move |v: &str| {
///             v.parse::<i64>().is_ok_and(|n| n.rem_euclid(2) == want)
///         }))
///     }
/// }
///
/// let validator = paramgate::Validator::builder()
///     .plugin(ParityPlugin)
///     .build("/list?page=[even]")
///     .unwrap();
/// assert!(validator.validate_url("/list?page=4"));
/// assert!(!validator.validate_url("/list?page=3"));
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `ConstraintPlugin`",
    label = "this type cannot compile constraint text",
    note = "implement `name`, `can_handle` and `compile` to register a constraint syntax"
)]
pub trait ConstraintPlugin: Send + Sync + Debug {
    /// Stable, non-empty identifier. Used as the validator cache namespace.
    fn name(&self) -> &str;

    /// Cheap, side-effect-free syntactic pre-check.
    ///
    /// Must not allocate heavily or do unbounded work. Returning `true` claims
    /// the constraint: no other plugin is consulted for it.
    fn can_handle(&self, constraint: &str) -> bool;

    /// Authoritative parse of a claimed constraint.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError`] when the constraint is malformed. The error
    /// aborts the whole parse.
    fn compile(&self, param: &str, constraint: &str) -> Result<Predicate, PluginError>;
}

#[diagnostic::do_not_recommend]
impl<T: ConstraintPlugin + ?Sized> ConstraintPlugin for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn can_handle(&self, constraint: &str) -> bool {
        (**self).can_handle(constraint)
    }

    fn compile(&self, param: &str, constraint: &str) -> Result<Predicate, PluginError> {
        (**self).compile(param, constraint)
    }
}

/// Find the plugin that owns `constraint`, if any.
pub(crate) fn claim<'a>(
    plugins: &'a [Arc<dyn ConstraintPlugin>],
    constraint: &str,
) -> Option<&'a Arc<dyn ConstraintPlugin>> {
    plugins.iter().find(|p| p.can_handle(constraint))
}
