//! URL tokenization into a path and ordered query pairs.
//!
//! Absolute URLs (`scheme://...`) are checked with the `url` crate; relative
//! request targets must start with `/`. Query strings are decoded with
//! `application/x-www-form-urlencoded` rules, but every pair also keeps its raw
//! segment so filtered output preserves the caller's exact encoding and order.

use crate::MAX_URL_LENGTH;
use std::borrow::Cow;
use url::form_urlencoded;

/// A request URL split at the `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitUrl<'a> {
    /// Path used for rule resolution.
    pub path: Cow<'a, str>,
    /// Original text before the `?` (or `#`), reused verbatim when rebuilding.
    pub base: &'a str,
    /// Raw query string without the leading `?`, if a `?` was present.
    pub query: Option<&'a str>,
}

/// One `key=value` segment of a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPair<'a> {
    /// The segment exactly as it appeared between `&` separators.
    pub raw: &'a str,
    /// Decoded key.
    pub key: Cow<'a, str>,
    /// Decoded value; empty for both `key` and `key=`.
    pub value: Cow<'a, str>,
}

/// Split a request URL into path, base and raw query.
///
/// Returns `None` when the input cannot be tokenized: longer than
/// [`MAX_URL_LENGTH`], containing control characters, a relative target not
/// starting with `/`, whitespace in the path, or an unparsable absolute URL.
///
/// ```
/// let split = paramgate::split_url("/search?q=rust#top").unwrap();
/// assert_eq!(split.path, "/search");
/// assert_eq!(split.query, Some("q=rust"));
/// ```
#[must_use]
pub fn split_url(url: &str) -> Option<SplitUrl<'_>> {
    if url.len() > MAX_URL_LENGTH || url.chars().any(char::is_control) {
        return None;
    }
    let without_fragment = url.split_once('#').map_or(url, |(before, _)| before);
    let (base, query) = match without_fragment.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (without_fragment, None),
    };

    let path = if base.starts_with('/') {
        base
    } else {
        absolute_path(url, base)?
    };
    if !is_request_path(path) {
        return None;
    }

    Some(SplitUrl {
        path: Cow::Borrowed(path),
        base,
        query,
    })
}

/// Raw path of an absolute URL, as written after the authority.
///
/// `url::Url` only decides whether the input is a well-formed absolute URL.
/// Its `path()` is re-encoded, so the path is sliced from `base` instead and
/// matched exactly like a relative target.
fn absolute_path<'a>(url: &str, base: &'a str) -> Option<&'a str> {
    let parsed = url::Url::parse(url).ok()?;
    if parsed.cannot_be_a_base() {
        return None;
    }
    let (_, rest) = base.split_once("://")?;
    Some(rest.find('/').map_or("/", |i| &rest[i..]))
}

/// Returns `true` if `path` is a tokenizable request path.
#[must_use]
pub(crate) fn is_request_path(path: &str) -> bool {
    path.len() <= MAX_URL_LENGTH
        && path.starts_with('/')
        && !path.chars().any(|c| c.is_whitespace() || c.is_control())
}

/// Decode a raw query string into ordered pairs.
///
/// Empty segments (`a=1&&b=2`) are skipped. A leading `?` is not stripped;
/// callers pass the text after it. Returns `None` for input longer than
/// [`MAX_URL_LENGTH`] or containing control characters.
///
/// ```
/// let pairs = paramgate::query_pairs("page=5&q=a%20b&flag").unwrap();
/// assert_eq!(pairs.len(), 3);
/// assert_eq!(pairs[1].value, "a b");
/// assert_eq!(pairs[2].value, "");
/// assert_eq!(pairs[1].raw, "q=a%20b");
/// ```
#[must_use]
pub fn query_pairs(query: &str) -> Option<Vec<QueryPair<'_>>> {
    if query.len() > MAX_URL_LENGTH || query.chars().any(char::is_control) {
        return None;
    }
    let pairs = query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .filter_map(|raw| {
            let (key, value) = form_urlencoded::parse(raw.as_bytes()).next()?;
            Some(QueryPair { raw, key, value })
        })
        .collect();
    Some(pairs)
}
