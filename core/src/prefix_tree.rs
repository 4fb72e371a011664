//! Segment trie for prefix-wildcard path lookups.
//!
//! Provides O(s) lookup where s is the number of path segments, with O(1)
//! child access via hash map indexing. Used by the resolver to find every
//! `/prefix/*` group that applies to a request path.

use std::collections::HashMap;

/// A trie keyed by `/`-separated path segments.
///
/// Because edges are whole segments, every prefix found by
/// [`find_all_prefixes`](Self::find_all_prefixes) lies on a segment boundary:
/// `/api` is a prefix of `/api/v1` but not of `/apix`.
///
/// # Performance
///
/// - Insert: O(s) where s is the segment count of the key
/// - Lookup: O(s) where s is the segment count of the path
/// - Child access: O(1) via hash map
#[derive(Debug, Clone)]
pub(crate) struct PrefixTree<V> {
    root: Node<V>,
    len: usize,
}

#[derive(Debug, Clone)]
struct Node<V> {
    value: Option<V>,
    children: HashMap<String, Node<V>>,
}

impl<V> Default for PrefixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PrefixTree<V> {
    /// Create an empty tree.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            root: Node::new(),
            len: 0,
        }
    }

    /// Insert a value under a literal path prefix (`""` is the root).
    ///
    /// If the prefix already exists, the value is replaced and the old value returned.
    pub(crate) fn insert(&mut self, prefix: &str, value: V) -> Option<V> {
        let mut node = &mut self.root;
        for segment in segments(prefix) {
            node = node.children.entry(segment.to_owned()).or_insert_with(Node::new);
        }
        let old = node.value.replace(value);
        if old.is_none() {
            self.len += 1;
        }
        old
    }

    /// Find the value stored under exactly `prefix`.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn get(&self, prefix: &str) -> Option<&V> {
        let mut node = &self.root;
        for segment in segments(prefix) {
            node = node.children.get(segment)?;
        }
        node.value.as_ref()
    }

    /// Find all values whose prefixes apply to `path`, shortest first.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut tree = PrefixTree::new();
    /// tree.insert("", "root");
    /// tree.insert("/api", "api");
    /// tree.insert("/api/v2", "api_v2");
    ///
    /// assert_eq!(tree.find_all_prefixes("/api/v2/users"), vec![&"root", &"api", &"api_v2"]);
    /// assert_eq!(tree.find_all_prefixes("/apix"), vec![&"root"]);
    /// ```
    #[must_use]
    pub(crate) fn find_all_prefixes(&self, path: &str) -> Vec<&V> {
        let mut results = Vec::new();
        let mut node = &self.root;
        if let Some(v) = &node.value {
            results.push(v);
        }
        for segment in segments(path) {
            let Some(child) = node.children.get(segment) else {
                break;
            };
            node = child;
            if let Some(v) = &node.value {
                results.push(v);
            }
        }
        results
    }

    /// Number of stored prefixes.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no prefixes are stored.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<V> Node<V> {
    fn new() -> Self {
        Self {
            value: None,
            children: HashMap::new(),
        }
    }
}

/// Split a path into segments, ignoring the leading `/`. `""` has no segments.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    trimmed.split('/').filter(move |_| !path.is_empty())
}
