//! Rule grammar parser
//!
//! Compiles rule text into a [`RuleSet`]:
//!
//! ```text
//! RuleSet    := RuleGroup (";" RuleGroup)*
//! RuleGroup  := (Path "?")? ParamList | Path "?" "*" | Path
//! ParamList  := ParamRule ("&" ParamRule)*
//! ParamRule  := Name ("=" "!"? "[" ConstraintBody "]")? | "*"
//! ```
//!
//! Separators inside brackets are literal, so `q=[a;b]` is one rule. Parsing
//! stops at the first error and never touches an installed rule set.
//!
//! # Constraint body dispatch
//!
//! | Body | Result |
//! |------|--------|
//! | `""` | key-only |
//! | `"?"` | callback |
//! | claimed by a plugin | plugin predicate (compile errors are final) |
//! | `"*"` | any non-empty value |
//! | `N-M` (either side may be negative) | numeric range |
//! | otherwise | comma-separated enum |

use crate::plugin::claim;
use crate::{
    CacheKey, ConstraintPlugin, ParamMatcher, ParamRule, ParseError, PathPattern, RuleSet,
    RuleSetBuilder, UrlRuleGroup, ValidatorCache, MAX_CONSTRAINT_LENGTH, MAX_ENUM_VALUES,
    MAX_PARAM_NAME_LENGTH, MAX_RULES_LENGTH, MAX_RULE_GROUPS,
};
use std::sync::Arc;

/// Characters that may never appear in a parameter name.
const FORBIDDEN_NAME_CHARS: &[char] = &['[', ']', '!', '=', '?', '&', ';', '#', '*'];

/// Rule-text compiler bound to a plugin chain and an optional validator cache.
///
/// # Example
///
/// ```
/// use paramgate::Parser;
///
/// let rules = Parser::new(&[]).parse("/users?page=[1-10];sort=[name,date]").unwrap();
/// assert_eq!(rules.len(), 2);
/// assert!(rules.resolve("/users").check("page", "3", None));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Parser<'a> {
    plugins: &'a [Arc<dyn ConstraintPlugin>],
    cache: Option<&'a ValidatorCache>,
}

impl<'a> Parser<'a> {
    /// Create a parser consulting `plugins` in order.
    #[must_use]
    pub fn new(plugins: &'a [Arc<dyn ConstraintPlugin>]) -> Self {
        Self {
            plugins,
            cache: None,
        }
    }

    /// Reuse and fill `cache` for plugin compilations.
    #[must_use]
    pub fn with_cache(mut self, cache: &'a ValidatorCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Compile rule text.
    ///
    /// # Errors
    ///
    /// - [`ParseError::SizeLimit`] when the text or one of its parts is too large
    /// - [`ParseError::Syntax`] for malformed text
    /// - [`ParseError::NumericRange`] for out-of-window or inverted ranges
    /// - [`ParseError::Plugin`] when a claiming plugin rejects its constraint
    pub fn parse(&self, text: &str) -> Result<RuleSet, ParseError> {
        if text.len() > MAX_RULES_LENGTH {
            return Err(ParseError::size_limit("rule text", text.len(), MAX_RULES_LENGTH));
        }
        check_brackets(text)?;

        let mut builder = RuleSetBuilder::new();
        let mut count = 0usize;
        for (offset, group) in split_outside_brackets(text, 0, ';') {
            let (offset, group) = trim_at(offset, group);
            if group.is_empty() {
                continue;
            }
            count += 1;
            if count > MAX_RULE_GROUPS {
                return Err(ParseError::size_limit("rule group count", count, MAX_RULE_GROUPS));
            }
            builder.add_group(self.parse_group(group, offset)?);
        }
        Ok(builder.build())
    }

    fn parse_group(&self, group: &str, offset: usize) -> Result<UrlRuleGroup, ParseError> {
        if !group.starts_with('/') {
            return self.parse_param_list(UrlRuleGroup::new(PathPattern::Global), group, offset);
        }
        let (path, params) = match group.split_once('?') {
            Some((path, params)) => (path, Some(params)),
            None => (group, None),
        };
        let pattern = PathPattern::parse_at(path.trim_end(), offset)?;
        let group_rules = UrlRuleGroup::new(pattern);
        match params {
            None => Ok(group_rules),
            Some(params) => self.parse_param_list(group_rules, params, offset + path.len() + 1),
        }
    }

    fn parse_param_list(
        &self,
        mut group: UrlRuleGroup,
        params: &str,
        offset: usize,
    ) -> Result<UrlRuleGroup, ParseError> {
        for (at, item) in split_outside_brackets(params, offset, '&') {
            let (at, item) = trim_at(at, item);
            if item.is_empty() {
                continue;
            }
            if item == "*" {
                group = group.with_allow_all();
                continue;
            }
            group.insert(self.parse_param(item, at)?);
        }
        Ok(group)
    }

    fn parse_param(&self, item: &str, offset: usize) -> Result<ParamRule, ParseError> {
        let Some((name, constraint)) = item.split_once('=') else {
            validate_name(item, offset)?;
            return Ok(ParamRule::new(item, ParamMatcher::any()));
        };
        validate_name(name, offset)?;

        let constraint_at = offset + name.len() + 1;
        let (inverted, bracketed) = match constraint.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, constraint),
        };
        let bracket_at = constraint_at + usize::from(inverted);
        let Some(open) = bracketed.strip_prefix('[') else {
            return Err(ParseError::syntax(
                bracket_at,
                format!("expected '[' after '=' for parameter \"{name}\""),
            ));
        };
        // brackets are balanced and unnested, so the first ']' closes this one
        let Some(close) = open.find(']') else {
            return Err(ParseError::syntax(bracket_at, "unterminated '['"));
        };
        let body = &open[..close];
        let trailing = &open[close + 1..];
        if !trailing.is_empty() {
            return Err(ParseError::syntax(
                bracket_at + close + 2,
                format!("unexpected text \"{trailing}\" after constraint for parameter \"{name}\""),
            ));
        }
        if body.len() > MAX_CONSTRAINT_LENGTH {
            return Err(ParseError::size_limit("constraint", body.len(), MAX_CONSTRAINT_LENGTH));
        }

        let matcher = self.compile_body(name, body, bracket_at + 1)?;
        Ok(ParamRule::new(name, matcher.with_inverted(inverted)))
    }

    fn compile_body(&self, name: &str, body: &str, offset: usize) -> Result<ParamMatcher, ParseError> {
        match body {
            "" => return Ok(ParamMatcher::key_only()),
            "?" => return Ok(ParamMatcher::callback()),
            _ => {}
        }
        if let Some(plugin) = claim(self.plugins, body) {
            return self.compile_plugin(plugin.as_ref(), name, body);
        }
        if body == "*" {
            return Ok(ParamMatcher::any());
        }
        if let Some((lo, hi)) = split_range(body) {
            return ParamMatcher::range(parse_bound(lo, body)?, parse_bound(hi, body)?);
        }

        let values: Vec<&str> = body.split(',').filter(|v| !v.is_empty()).collect();
        if values.len() > MAX_ENUM_VALUES {
            return Err(ParseError::size_limit("enum value count", values.len(), MAX_ENUM_VALUES));
        }
        ParamMatcher::enumeration(values).ok_or_else(|| {
            ParseError::syntax(offset, format!("empty value list for parameter \"{name}\""))
        })
    }

    fn compile_plugin(
        &self,
        plugin: &dyn ConstraintPlugin,
        name: &str,
        body: &str,
    ) -> Result<ParamMatcher, ParseError> {
        let key = CacheKey::new(plugin.name(), name, body);
        if let Some(predicate) = self.cache.and_then(|c| c.get(&key)) {
            return Ok(ParamMatcher::plugin(plugin.name(), body, predicate));
        }
        let predicate = plugin
            .compile(name, body)
            .map_err(|source| ParseError::Plugin {
                plugin: plugin.name().to_owned(),
                param: name.to_owned(),
                constraint: body.to_owned(),
                source,
            })?;
        if let Some(cache) = self.cache {
            cache.insert(key, Arc::clone(&predicate));
        }
        Ok(ParamMatcher::plugin(plugin.name(), body, predicate))
    }
}

/// Compile rule text with no plugins.
///
/// # Errors
///
/// See [`Parser::parse`].
pub fn parse_rules(text: &str) -> Result<RuleSet, ParseError> {
    Parser::new(&[]).parse(text)
}

/// Check rule text with no plugins, discarding the result.
///
/// # Errors
///
/// See [`Parser::parse`].
pub fn check_rules(text: &str) -> Result<(), ParseError> {
    parse_rules(text).map(drop)
}

/// Check rule text against a plugin chain, discarding the result.
///
/// # Errors
///
/// See [`Parser::parse`].
pub fn check_rules_with_plugins(
    text: &str,
    plugins: &[Arc<dyn ConstraintPlugin>],
) -> Result<(), ParseError> {
    Parser::new(plugins).parse(text).map(drop)
}

/// Validate a parameter name found at `offset`.
pub(crate) fn validate_name(name: &str, offset: usize) -> Result<(), ParseError> {
    if name.is_empty() {
        return Err(ParseError::syntax(offset, "empty parameter name"));
    }
    if name.len() > MAX_PARAM_NAME_LENGTH {
        return Err(ParseError::size_limit("parameter name", name.len(), MAX_PARAM_NAME_LENGTH));
    }
    if let Some((i, c)) = name
        .char_indices()
        .find(|&(_, c)| c.is_whitespace() || c.is_control() || FORBIDDEN_NAME_CHARS.contains(&c))
    {
        return Err(ParseError::syntax(
            offset + i,
            format!("character {c:?} is not allowed in parameter name \"{name}\""),
        ));
    }
    Ok(())
}

/// Reject nested, unmatched or unterminated brackets in one pass.
fn check_brackets(text: &str) -> Result<(), ParseError> {
    let mut open_at: Option<usize> = None;
    for (i, b) in text.bytes().enumerate() {
        match (b, open_at) {
            (b'[', None) => open_at = Some(i),
            (b'[', Some(_)) => return Err(ParseError::syntax(i, "nested '['")),
            (b']', Some(_)) => open_at = None,
            (b']', None) => return Err(ParseError::syntax(i, "unmatched ']'")),
            _ => {}
        }
    }
    match open_at {
        Some(i) => Err(ParseError::syntax(i, "unterminated '['")),
        None => Ok(()),
    }
}

/// Split on `sep` outside brackets, yielding each piece with its absolute offset.
fn split_outside_brackets(text: &str, base: usize, sep: char) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut depth = 0u8;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '[' => depth = 1,
            ']' => depth = 0,
            c if c == sep && depth == 0 => {
                pieces.push((base + start, &text[start..i]));
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push((base + start, &text[start..]));
    pieces
}

fn trim_at(offset: usize, text: &str) -> (usize, &str) {
    let trimmed = text.trim_start();
    (offset + (text.len() - trimmed.len()), trimmed.trim_end())
}

/// Split `-?digits--?digits` into its two bounds.
fn split_range(body: &str) -> Option<(&str, &str)> {
    let unsigned = body.strip_prefix('-').unwrap_or(body);
    let sign = body.len() - unsigned.len();
    let digits = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let split = sign + digits;
    let hi = body[split..].strip_prefix('-')?;
    let hi_digits = hi.strip_prefix('-').unwrap_or(hi);
    if hi_digits.is_empty() || !hi_digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((&body[..split], hi))
}

fn parse_bound(text: &str, constraint: &str) -> Result<i64, ParseError> {
    text.parse::<i64>().map_err(|_| {
        ParseError::numeric(constraint, format!("{text} does not fit a 64-bit integer"))
    })
}
