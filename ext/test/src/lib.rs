//! paramgate-test: Test domain for conformance testing
//!
//! Provides instrumented plugins and callbacks with predictable behavior, plus
//! (behind the `fixtures` feature) a YAML fixture runner.
//!
//! # Example
//!
//! ```
//! use paramgate_test::prelude::*;
//!
//! let counting = CountingPlugin::new(ExactPlugin);
//! let calls = counting.calls();
//!
//! let v = Validator::builder()
//!     .plugin(counting)
//!     .build("/a?x=[=yes];/b?x=[=yes]")
//!     .unwrap();
//!
//! assert!(v.validate_url("/a?x=yes"));
//! // the second group reused the cached predicate for the same (plugin, param, constraint)
//! assert_eq!(calls.get(), 1);
//! ```

use paramgate::{Callback, ConstraintPlugin, PluginError, Predicate};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[cfg(feature = "fixtures")]
pub mod fixture;

/// Accepts `=literal` constraints and matches the literal byte-exactly.
///
/// `=` alone is a compile error, which makes it handy for exercising the
/// "claimed but rejected" path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactPlugin;

impl ConstraintPlugin for ExactPlugin {
    fn name(&self) -> &str {
        "exact"
    }

    fn can_handle(&self, constraint: &str) -> bool {
        constraint.starts_with('=')
    }

    fn compile(&self, _param: &str, constraint: &str) -> Result<Predicate, PluginError> {
        let literal = constraint.strip_prefix('=').unwrap_or(constraint).to_owned();
        if literal.is_empty() {
            return Err(PluginError::new("missing literal after '='"));
        }
        Ok(Arc::new(move |value: &str| value == literal))
    }
}

/// Shared view of a [`CountingPlugin`]'s compile counter.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    /// Number of `compile` calls so far.
    #[must_use]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Wraps a plugin and counts how often `compile` runs.
#[derive(Debug)]
pub struct CountingPlugin<P> {
    inner: P,
    calls: CallCounter,
}

impl<P: ConstraintPlugin> CountingPlugin<P> {
    /// Wrap `inner`.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            calls: CallCounter::default(),
        }
    }

    /// Handle to the compile counter, usable after the plugin is moved.
    #[must_use]
    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

impl<P: ConstraintPlugin> ConstraintPlugin for CountingPlugin<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn can_handle(&self, constraint: &str) -> bool {
        self.inner.can_handle(constraint)
    }

    fn compile(&self, param: &str, constraint: &str) -> Result<Predicate, PluginError> {
        self.calls.0.fetch_add(1, Ordering::SeqCst);
        self.inner.compile(param, constraint)
    }
}

/// Callback that accepts exactly the listed `(name, value)` pairs.
pub fn allow_list_callback<I, K, V>(pairs: I) -> Callback
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let allowed: HashSet<(String, String)> = pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    Arc::new(move |name: &str, value: &str| allowed.contains(&(name.to_owned(), value.to_owned())))
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{allow_list_callback, CallCounter, CountingPlugin, ExactPlugin};
    pub use paramgate::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramgate::Validator;

    #[test]
    fn exact_plugin_matches_literal() {
        let p = ExactPlugin.compile("x", "=a b").unwrap();
        assert!(p("a b"));
        assert!(!p("a"));
        assert!(ExactPlugin.compile("x", "=").is_err());
    }

    #[test]
    fn counting_plugin_counts_compiles() {
        let plugin = CountingPlugin::new(ExactPlugin);
        let calls = plugin.calls();
        plugin.compile("a", "=1").unwrap();
        plugin.compile("a", "=2").unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn cache_keys_include_param_name() {
        let plugin = CountingPlugin::new(ExactPlugin);
        let calls = plugin.calls();
        let v = Validator::builder()
            .plugin(plugin)
            .build("/a?x=[=1]&y=[=1]")
            .unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(v.cache_len(), 2);
    }

    #[test]
    fn clearing_cache_forces_recompile() {
        let plugin = CountingPlugin::new(ExactPlugin);
        let calls = plugin.calls();
        let v = Validator::builder().plugin(plugin).build("/a?x=[=1]").unwrap();
        v.parse_rules("/a?x=[=1]").unwrap();
        assert_eq!(calls.get(), 1);

        v.clear_cache();
        v.parse_rules("/a?x=[=1]").unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn allow_list() {
        let cb = allow_list_callback([("token", "abc")]);
        assert!(cb("token", "abc"));
        assert!(!cb("token", "abd"));
        assert!(!cb("other", "abc"));
    }
}
