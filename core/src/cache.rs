//! `ValidatorCache` — memoized plugin compilations
//!
//! Keyed by the full `(plugin, param, constraint)` triple so a predicate
//! compiled for one parameter is never handed to another. Hits and misses
//! only change how much work the parser does, never what it produces.

use crate::Predicate;
use dashmap::DashMap;
use std::fmt;

/// Cache key for a compiled plugin predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Plugin name.
    pub plugin: String,
    /// Parameter the constraint was written for.
    pub param: String,
    /// Constraint text as written between the brackets.
    pub constraint: String,
}

impl CacheKey {
    /// Build a key from borrowed parts.
    pub fn new(plugin: &str, param: &str, constraint: &str) -> Self {
        Self {
            plugin: plugin.to_owned(),
            param: param.to_owned(),
            constraint: constraint.to_owned(),
        }
    }
}

/// Concurrent map from [`CacheKey`] to compiled [`Predicate`].
///
/// Safe to share between threads without external locking. Two threads
/// racing on the same miss both compile; the later insert wins.
#[derive(Default)]
pub struct ValidatorCache {
    entries: DashMap<CacheKey, Predicate>,
}

impl ValidatorCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a compiled predicate.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Predicate> {
        let hit = self.entries.get(key).map(|entry| entry.value().clone());
        if hit.is_some() {
            tracing::trace!(plugin = %key.plugin, param = %key.param, "validator cache hit");
        } else {
            tracing::trace!(plugin = %key.plugin, param = %key.param, "validator cache miss");
        }
        hit
    }

    /// Store a compiled predicate, replacing any previous entry.
    pub fn insert(&self, key: CacheKey, predicate: Predicate) {
        self.entries.insert(key, predicate);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached predicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ValidatorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorCache")
            .field("len", &self.entries.len())
            .finish()
    }
}
