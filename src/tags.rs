//! Tag lists: string key/value metadata.
//!
//! Every array carries one global [`TagList`] plus one per dimension and one
//! per component. Keys are unique within a list (the last `set` wins) and
//! iteration is key-sorted, so serialized output is deterministic.
//!
//! Typed lookups parse the stored string; text that does not parse is treated
//! the same as an absent key, never as an error.

use std::collections::BTreeMap;
use std::str::FromStr;

/// A uniquely-keyed, key-sorted collection of string tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct TagList {
    tags: BTreeMap<String, String>,
}

impl TagList {
    /// Create an empty tag list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a tag.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Remove a tag if present. Removing an absent key is a no-op.
    pub fn unset(&mut self, key: &str) {
        self.tags.remove(key);
    }

    /// Remove all tags.
    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// The stored string for `key`, if any.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// The stored string for `key`, or `default` when absent.
    pub fn value_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.value(key).unwrap_or(default)
    }

    /// Parse the stored string for `key` as `T`.
    ///
    /// Absent keys and malformed or out-of-range text both yield `None`.
    pub fn parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.value(key).and_then(|v| v.parse().ok())
    }

    /// Iterate over all tags in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> IntoIterator for &'a TagList {
    type Item = (&'a str, &'a str);
    type IntoIter = std::iter::Map<
        std::collections::btree_map::Iter<'a, String, String>,
        fn((&'a String, &'a String)) -> (&'a str, &'a str),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
