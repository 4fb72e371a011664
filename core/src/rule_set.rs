//! `RuleSet` — Immutable snapshot of compiled rule groups
//!
//! A rule set owns one optional global group and any number of path groups.
//! Lookups go through two indexes built once per snapshot:
//!
//! - exact paths in a hash map, O(1)
//! - prefix wildcards in a segment trie, O(segments)
//!
//! [`RuleSet::resolve`] returns the applicable groups most specific first.
//! For each parameter the first group that either names it or allows all
//! parameters decides; nothing else is consulted.

use crate::prefix_tree::PrefixTree;
use crate::{Callback, ParamMatcher, PathPattern};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// A named parameter constraint.
#[derive(Debug, Clone)]
pub struct ParamRule {
    name: String,
    matcher: ParamMatcher,
}

impl ParamRule {
    /// Create a rule for parameter `name`.
    pub fn new(name: impl Into<String>, matcher: ParamMatcher) -> Self {
        Self {
            name: name.into(),
            matcher,
        }
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compiled constraint.
    #[must_use]
    pub fn matcher(&self) -> &ParamMatcher {
        &self.matcher
    }
}

/// Renders `name` for a plain wildcard, otherwise `name=[...]`.
impl fmt::Display for ParamRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain_any = !self.matcher.is_inverted()
            && matches!(self.matcher.kind(), crate::MatcherKind::Any);
        if plain_any {
            f.write_str(&self.name)
        } else {
            write!(f, "{}={}", self.name, self.matcher)
        }
    }
}

/// Parameter rules that apply to one path pattern.
#[derive(Debug, Clone)]
pub struct UrlRuleGroup {
    pattern: PathPattern,
    params: BTreeMap<String, ParamRule>,
    allow_all_params: bool,
}

impl UrlRuleGroup {
    /// Create an empty group. An empty path group still marks its path as known.
    #[must_use]
    pub fn new(pattern: PathPattern) -> Self {
        Self {
            pattern,
            params: BTreeMap::new(),
            allow_all_params: false,
        }
    }

    /// Add a rule, replacing any earlier rule with the same name.
    #[must_use]
    pub fn with_param(mut self, rule: ParamRule) -> Self {
        self.insert(rule);
        self
    }

    /// Mark every parameter as permitted with any value (`path?*`).
    #[must_use]
    pub fn with_allow_all(mut self) -> Self {
        self.allow_all_params = true;
        self
    }

    /// Add a rule, returning the rule it replaced.
    pub fn insert(&mut self, rule: ParamRule) -> Option<ParamRule> {
        self.params.insert(rule.name.clone(), rule)
    }

    /// Fold `other` into this group. Rules in `other` win on name collisions.
    pub fn merge(&mut self, other: UrlRuleGroup) {
        self.allow_all_params |= other.allow_all_params;
        self.params.extend(other.params);
    }

    /// The path pattern this group applies to.
    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Rule for `name`, if this group defines one.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamRule> {
        self.params.get(name)
    }

    /// All rules, ordered by name.
    pub fn params(&self) -> impl Iterator<Item = &ParamRule> {
        self.params.values()
    }

    /// Returns `true` for `path?*` groups.
    #[must_use]
    pub fn allows_all_params(&self) -> bool {
        self.allow_all_params
    }

    /// Number of parameter rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if the group names no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Renders one rule group as rule text.
impl fmt::Display for UrlRuleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.params.values().map(ToString::to_string).collect();
        if self.allow_all_params {
            parts.push("*".to_owned());
        }
        match &self.pattern {
            PathPattern::Global => f.write_str(&parts.join("&")),
            pattern if parts.is_empty() => write!(f, "{pattern}"),
            pattern => write!(f, "{pattern}?{}", parts.join("&")),
        }
    }
}

/// How a single parameter name resolved against the applicable groups.
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    /// The most specific deciding group names the parameter.
    Rule(&'a UrlRuleGroup, &'a ParamRule),
    /// The most specific deciding group allows every parameter.
    Wildcard(&'a UrlRuleGroup),
    /// No applicable group names or wildcards the parameter.
    Unknown,
}

/// Groups applicable to one request path, most specific first.
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    groups: Vec<&'a UrlRuleGroup>,
}

impl<'a> Resolution<'a> {
    /// Returns `true` if at least one group applies, even one with zero rules.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Applicable groups, most specific first.
    #[must_use]
    pub fn groups(&self) -> &[&'a UrlRuleGroup] {
        &self.groups
    }

    /// Find the group that decides `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Lookup<'a> {
        for group in &self.groups {
            if let Some(rule) = group.get(name) {
                return Lookup::Rule(group, rule);
            }
            if group.allows_all_params() {
                return Lookup::Wildcard(group);
            }
        }
        Lookup::Unknown
    }

    /// Evaluate one observed parameter. Unknown parameters are rejected.
    #[must_use]
    pub fn check(&self, name: &str, value: &str, callback: Option<&Callback>) -> bool {
        match self.lookup(name) {
            Lookup::Rule(_, rule) => rule.matcher().evaluate(name, value, callback),
            Lookup::Wildcard(_) => true,
            Lookup::Unknown => false,
        }
    }
}

/// Immutable, indexed snapshot of every rule group.
///
/// Built by the parser or a [`RuleSetBuilder`]; never mutated once built.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    global: Option<Arc<UrlRuleGroup>>,
    groups: Vec<Arc<UrlRuleGroup>>,
    exact: HashMap<String, Arc<UrlRuleGroup>>,
    prefixes: PrefixTree<Arc<UrlRuleGroup>>,
}

impl RuleSet {
    /// A rule set that permits nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start a builder pre-filled with this set's groups.
    #[must_use]
    pub fn to_builder(&self) -> RuleSetBuilder {
        let mut builder = RuleSetBuilder::new();
        for group in self.global.iter().chain(&self.groups) {
            builder.add_group(UrlRuleGroup::clone(group));
        }
        builder
    }

    /// Groups applicable to `path`, most specific first.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Resolution<'_> {
        let mut groups: Vec<&UrlRuleGroup> = Vec::new();
        if let Some(exact) = self.exact.get(path) {
            groups.push(exact);
        }
        // shortest-first from the trie; reverse for most specific first
        let prefixes = self.prefixes.find_all_prefixes(path);
        groups.extend(prefixes.into_iter().rev().map(|g| &**g));
        if let Some(global) = &self.global {
            groups.push(global);
        }
        Resolution { groups }
    }

    /// The global group, if any rules were written without a path.
    #[must_use]
    pub fn global(&self) -> Option<&UrlRuleGroup> {
        self.global.as_deref()
    }

    /// Path groups, most specific first.
    pub fn groups(&self) -> impl Iterator<Item = &UrlRuleGroup> {
        self.groups.iter().map(|g| &**g)
    }

    /// Number of groups, counting the global group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len() + usize::from(self.global.is_some())
    }

    /// Returns `true` if this set permits nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Renders the whole set as `;`-separated rule text.
impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for group in self.global.iter().chain(&self.groups) {
            if !first {
                f.write_str(";")?;
            }
            first = false;
            write!(f, "{group}")?;
        }
        Ok(())
    }
}

/// Accumulates groups and builds an indexed [`RuleSet`].
///
/// Groups sharing a pattern are merged; later rules override earlier ones.
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    global: Option<UrlRuleGroup>,
    paths: HashMap<PathPattern, UrlRuleGroup>,
}

impl RuleSetBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or merge a group.
    pub fn add_group(&mut self, group: UrlRuleGroup) -> &mut Self {
        if matches!(group.pattern(), PathPattern::Global) {
            match &mut self.global {
                Some(existing) => existing.merge(group),
                None => self.global = Some(group),
            }
        } else if let Some(existing) = self.paths.get_mut(group.pattern()) {
            existing.merge(group);
        } else {
            self.paths.insert(group.pattern().clone(), group);
        }
        self
    }

    /// Number of distinct groups collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len() + usize::from(self.global.is_some())
    }

    /// Returns `true` if no groups were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freeze into an indexed snapshot.
    #[must_use]
    pub fn build(self) -> RuleSet {
        let mut groups: Vec<Arc<UrlRuleGroup>> = self.paths.into_values().map(Arc::new).collect();
        groups.sort_by(|a, b| {
            b.pattern()
                .specificity()
                .cmp(&a.pattern().specificity())
                .then_with(|| a.pattern().to_string().cmp(&b.pattern().to_string()))
        });

        let mut exact = HashMap::new();
        let mut prefixes = PrefixTree::new();
        for group in &groups {
            match group.pattern() {
                PathPattern::Exact(p) => {
                    exact.insert(p.clone(), Arc::clone(group));
                }
                PathPattern::Prefix(p) => {
                    prefixes.insert(p, Arc::clone(group));
                }
                PathPattern::Global => {}
            }
        }
        debug_assert_eq!(prefixes.len() + exact.len(), groups.len());

        RuleSet {
            global: self.global.map(Arc::new),
            groups,
            exact,
            prefixes,
        }
    }
}
