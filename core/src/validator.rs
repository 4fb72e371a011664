//! `Validator` — the public API over the rule store
//!
//! Every read operation takes one snapshot of the active [`RuleSet`] and
//! answers from it alone, so concurrent writers can never expose a torn state.
//! Reads are total: untokenizable input is simply not permitted.

use crate::parser::validate_name;
use crate::query::is_request_path;
use crate::rule_set::Lookup;
use crate::{
    query_pairs, split_url, Callback, ConstraintPlugin, ParamRule, ParamTrace, ParseError, Parser,
    PathPattern, QueryPair, Resolution, RuleSet, RuleStore, UrlRuleGroup, UrlTrace,
    ValidatorCache, Verdict, MAX_RULE_GROUPS,
};
use std::fmt;
use std::sync::Arc;

/// Query-parameter policy validator.
///
/// Cheap to share: wrap it in an [`Arc`] and call it from any number of threads.
///
/// # Example
///
/// ```
/// use paramgate::Validator;
///
/// let v = Validator::new("/*?page=[1-100];/users?page=[1-10]").unwrap();
/// assert!(!v.validate_url("/users?page=50"));
/// assert!(v.validate_url("/users?page=5"));
/// assert!(v.validate_url("/posts?page=50"));
///
/// // a failed update leaves the active rules in place
/// assert!(v.parse_rules("page=[1&limit=[5]").is_err());
/// assert!(v.validate_url("/users?page=5"));
/// ```
pub struct Validator {
    store: RuleStore,
    cache: ValidatorCache,
    plugins: Vec<Arc<dyn ConstraintPlugin>>,
    callback: Option<Callback>,
}

/// Builder for [`Validator`].
#[derive(Default)]
pub struct ValidatorBuilder {
    plugins: Vec<Arc<dyn ConstraintPlugin>>,
    callback: Option<Callback>,
}

impl ValidatorBuilder {
    /// Register a plugin. Plugins are consulted in registration order.
    #[must_use]
    pub fn plugin(mut self, plugin: impl ConstraintPlugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Register several shared plugins, keeping their order.
    #[must_use]
    pub fn plugins(mut self, plugins: impl IntoIterator<Item = Arc<dyn ConstraintPlugin>>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    /// Decision function for `name=[?]` parameters.
    #[must_use]
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Compile `rules` and build the validator.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] if `rules` does not compile.
    pub fn build(self, rules: &str) -> Result<Validator, ParseError> {
        let validator = Validator {
            store: RuleStore::default(),
            cache: ValidatorCache::new(),
            plugins: self.plugins,
            callback: self.callback,
        };
        validator.parse_rules(rules)?;
        Ok(validator)
    }
}

impl fmt::Debug for ValidatorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorBuilder")
            .field("plugins", &self.plugins)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            store: RuleStore::default(),
            cache: ValidatorCache::new(),
            plugins: Vec::new(),
            callback: None,
        }
    }
}

impl Validator {
    /// Compile `rules` with no plugins and no callback.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] if `rules` does not compile.
    pub fn new(rules: &str) -> Result<Self, ParseError> {
        Self::builder().build(rules)
    }

    /// Start configuring a validator.
    #[must_use]
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::default()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Writers
    // ═══════════════════════════════════════════════════════════════════════

    /// Replace the active rules with `text`.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`]; the active rules are untouched.
    pub fn parse_rules(&self, text: &str) -> Result<(), ParseError> {
        match self.parser().parse(text) {
            Ok(rules) => {
                self.store.publish(rules);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "rejected rule text");
                Err(e)
            }
        }
    }

    /// Compile `text` with this validator's plugins without installing it.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] if `text` does not compile.
    pub fn check_rules(&self, text: &str) -> Result<(), ParseError> {
        Parser::new(&self.plugins).parse(text).map(drop)
    }

    /// Merge one group into the active rules. Rules for names already present
    /// on `path` are replaced.
    ///
    /// `path` uses rule syntax (`/users`, `/api/*`); an empty path adds global rules.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Syntax`] for a malformed path or parameter name
    /// - [`ParseError::SizeLimit`] when the group count would exceed [`MAX_RULE_GROUPS`]
    pub fn add_url_rule(
        &self,
        path: &str,
        params: impl IntoIterator<Item = ParamRule>,
    ) -> Result<(), ParseError> {
        let pattern = if path.is_empty() {
            PathPattern::Global
        } else {
            PathPattern::parse(path)?
        };
        let mut group = UrlRuleGroup::new(pattern);
        for rule in params {
            validate_name(rule.name(), 0)?;
            group.insert(rule);
        }

        let result = self.store.update(|current| {
            let mut builder = current.to_builder();
            builder.add_group(group.clone());
            if builder.len() > MAX_RULE_GROUPS {
                return Err(ParseError::size_limit(
                    "rule group count",
                    builder.len(),
                    MAX_RULE_GROUPS,
                ));
            }
            Ok(builder.build())
        });
        if let Err(e) = &result {
            tracing::warn!(error = %e, path, "rejected url rule");
        }
        result
    }

    /// Install an empty rule set. Every read then answers "not permitted".
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Drop every cached plugin predicate.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Readers
    // ═══════════════════════════════════════════════════════════════════════

    /// `true` iff the path is known and every query pair is allowed.
    #[must_use]
    pub fn validate_url(&self, url: &str) -> bool {
        let Some(split) = split_url(url) else {
            return false;
        };
        let rules = self.store.load();
        self.validate_split(&rules, &split.path, split.query.unwrap_or(""))
    }

    /// `true` iff `name=value` is allowed on `path`.
    #[must_use]
    pub fn validate_param(&self, path: &str, name: &str, value: &str) -> bool {
        if !is_request_path(path) {
            return false;
        }
        let rules = self.store.load();
        rules
            .resolve(path)
            .check(name, value, self.callback.as_ref())
    }

    /// Like [`validate_url`](Self::validate_url) with path and raw query given
    /// separately. A leading `?` on `query` is ignored; an empty query is valid
    /// iff the path is known.
    #[must_use]
    pub fn validate_query_params(&self, path: &str, query: &str) -> bool {
        if !is_request_path(path) {
            return false;
        }
        let query = query.strip_prefix('?').unwrap_or(query);
        let rules = self.store.load();
        self.validate_split(&rules, path, query)
    }

    /// Rebuild `url` keeping only allowed pairs, in original order and encoding.
    ///
    /// The fragment is dropped and no trailing `?` is left when nothing survives.
    /// Untokenizable input yields an empty string.
    #[must_use]
    pub fn normalize_url(&self, url: &str) -> String {
        let Some(split) = split_url(url) else {
            return String::new();
        };
        let rules = self.store.load();
        let resolution = rules.resolve(&split.path);
        let kept = match split.query {
            Some(query) => match self.kept_segments(&resolution, query) {
                Some(kept) => kept,
                None => return String::new(),
            },
            None => Vec::new(),
        };
        if kept.is_empty() {
            split.base.to_owned()
        } else {
            format!("{}?{}", split.base, kept.join("&"))
        }
    }

    /// Alias of [`normalize_url`](Self::normalize_url).
    #[must_use]
    pub fn filter_url(&self, url: &str) -> String {
        self.normalize_url(url)
    }

    /// Filter a raw query string for `path`, returning the surviving segments
    /// joined with `&` and no leading `?`.
    #[must_use]
    pub fn filter_query_params(&self, path: &str, query: &str) -> String {
        if !is_request_path(path) {
            return String::new();
        }
        let query = query.strip_prefix('?').unwrap_or(query);
        let rules = self.store.load();
        self.kept_segments(&rules.resolve(path), query)
            .map(|kept| kept.join("&"))
            .unwrap_or_default()
    }

    /// Alias of [`filter_query_params`](Self::filter_query_params).
    #[must_use]
    pub fn filter_query(&self, path: &str, query: &str) -> String {
        self.filter_query_params(path, query)
    }

    /// Evaluate `url` and report how every pair was judged.
    #[must_use]
    pub fn explain_url(&self, url: &str) -> UrlTrace {
        let Some(split) = split_url(url) else {
            return UrlTrace::untokenizable(url);
        };
        let rules = self.store.load();
        let resolution = rules.resolve(&split.path);
        let pairs = query_pairs(split.query.unwrap_or("")).unwrap_or_default();

        let params: Vec<ParamTrace> = pairs.iter().map(|p| self.trace_pair(&resolution, p)).collect();
        let known = resolution.is_known();
        let valid = known && params.iter().all(|p| p.verdict.is_allowed());

        let kept: Vec<&str> = params
            .iter()
            .filter(|p| p.verdict.is_allowed())
            .map(|p| p.raw.as_str())
            .collect();
        let normalized = if kept.is_empty() {
            split.base.to_owned()
        } else {
            format!("{}?{}", split.base, kept.join("&"))
        };

        UrlTrace {
            url: url.to_owned(),
            path: Some(split.path.into_owned()),
            known,
            groups: resolution
                .groups()
                .iter()
                .map(|g| g.pattern().to_string())
                .collect(),
            params,
            valid,
            normalized,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Introspection
    // ═══════════════════════════════════════════════════════════════════════

    /// Snapshot of the active rules.
    #[must_use]
    pub fn rules(&self) -> Arc<RuleSet> {
        self.store.load()
    }

    /// Registered plugins in dispatch order.
    #[must_use]
    pub fn plugins(&self) -> &[Arc<dyn ConstraintPlugin>] {
        &self.plugins
    }

    /// Number of cached plugin predicates.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn parser(&self) -> Parser<'_> {
        Parser::new(&self.plugins).with_cache(&self.cache)
    }

    fn validate_split(&self, rules: &RuleSet, path: &str, query: &str) -> bool {
        let resolution = rules.resolve(path);
        if !resolution.is_known() {
            return false;
        }
        let Some(pairs) = query_pairs(query) else {
            return false;
        };
        let callback = self.callback.as_ref();
        pairs
            .iter()
            .all(|p| resolution.check(&p.key, &p.value, callback))
    }

    fn kept_segments<'q>(&self, resolution: &Resolution<'_>, query: &'q str) -> Option<Vec<&'q str>> {
        let callback = self.callback.as_ref();
        let pairs = query_pairs(query)?;
        Some(
            pairs
                .into_iter()
                .filter(|p| resolution.check(&p.key, &p.value, callback))
                .map(|p| p.raw)
                .collect(),
        )
    }

    fn trace_pair(&self, resolution: &Resolution<'_>, pair: &QueryPair<'_>) -> ParamTrace {
        let (verdict, group, matcher) = match resolution.lookup(&pair.key) {
            Lookup::Rule(group, rule) => {
                let allowed = rule
                    .matcher()
                    .evaluate(&pair.key, &pair.value, self.callback.as_ref());
                let verdict = if allowed { Verdict::Allowed } else { Verdict::Rejected };
                (
                    verdict,
                    Some(group.pattern().to_string()),
                    Some(rule.matcher().to_string()),
                )
            }
            Lookup::Wildcard(group) => (
                Verdict::AllowedByWildcard,
                Some(group.pattern().to_string()),
                None,
            ),
            Lookup::Unknown => (Verdict::Unknown, None, None),
        };
        ParamTrace {
            key: pair.key.clone().into_owned(),
            value: pair.value.clone().into_owned(),
            raw: pair.raw.to_owned(),
            verdict,
            group,
            matcher,
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("groups", &self.store.load().len())
            .field("plugins", &self.plugins)
            .field("cache", &self.cache)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
