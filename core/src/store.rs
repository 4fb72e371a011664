//! `RuleStore` — atomically swappable holder of the active [`RuleSet`]
//!
//! Readers take a snapshot with [`RuleStore::load`] and keep using it for the
//! whole call, so they always see one fully-formed rule set. Writers build a
//! new set off to the side and install it with one atomic store.

use crate::RuleSet;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Lock-free slot holding the current [`RuleSet`].
#[derive(Debug)]
pub struct RuleStore {
    current: ArcSwap<RuleSet>,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new(RuleSet::empty())
    }
}

impl RuleStore {
    /// Create a store holding `initial`.
    #[must_use]
    pub fn new(initial: RuleSet) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Snapshot of the active rule set.
    #[must_use]
    pub fn load(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }

    /// Install `rules`, replacing whatever was active.
    pub fn publish(&self, rules: RuleSet) {
        let groups = rules.len();
        self.current.store(Arc::new(rules));
        tracing::debug!(groups, "rule set published");
    }

    /// Read-modify-publish. `f` may run more than once under contention and
    /// must derive its result only from the snapshot it is given.
    ///
    /// # Errors
    ///
    /// If `f` fails the active rule set is left untouched and the error returned.
    pub fn update<E, F>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&RuleSet) -> Result<RuleSet, E>,
    {
        let mut failure = None;
        self.current.rcu(|current| match f(&**current) {
            Ok(next) => {
                failure = None;
                Arc::new(next)
            }
            Err(e) => {
                failure = Some(e);
                Arc::clone(current)
            }
        });
        match failure {
            Some(e) => Err(e),
            None => {
                tracing::debug!(groups = self.current.load().len(), "rule set updated");
                Ok(())
            }
        }
    }

    /// Install an empty rule set.
    pub fn clear(&self) {
        self.current.store(Arc::new(RuleSet::empty()));
        tracing::debug!("rule set cleared");
    }
}
