use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping from desired attribute names to actual column names.
///
/// Serialises as a JSON object in declaration order, so maps can be kept in
/// configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslationMap {
    entries: IndexMap<String, String>,
}

impl TranslationMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `desired` to `actual`. Remapping a desired name keeps its
    /// original position.
    pub fn insert(&mut self, desired: impl Into<String>, actual: impl Into<String>) {
        self.entries.insert(desired.into(), actual.into());
    }

    /// The actual column name for `desired`.
    #[must_use]
    pub fn get(&self, desired: &str) -> Option<&str> {
        self.entries.get(desired).map(String::as_str)
    }

    /// Whether `key` is a desired name in this map.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The actual column name for `key`, or `key` itself when it is unmapped.
    #[must_use]
    pub fn actual_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).unwrap_or(key)
    }

    /// Desired names in declaration order.
    pub fn desired_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Actual → desired lookup. When several desired names share an actual
    /// name the last declared one wins.
    #[must_use]
    pub fn inverse(&self) -> HashMap<&str, &str> {
        self.entries.iter().map(|(d, a)| (a.as_str(), d.as_str())).collect()
    }

    /// Whether every desired name maps to a distinct actual name.
    #[must_use]
    pub fn is_invertible(&self) -> bool {
        self.inverse().len() == self.entries.len()
    }

    /// `(desired, actual)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(d, a)| (d.as_str(), a.as_str()))
    }

    /// Number of mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no mappings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<D: Into<String>, A: Into<String>> FromIterator<(D, A)> for TranslationMap {
    fn from_iter<I: IntoIterator<Item = (D, A)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (desired, actual) in iter {
            map.insert(desired, actual);
        }
        map
    }
}

impl<const N: usize> From<[(&str, &str); N]> for TranslationMap {
    fn from(entries: [(&str, &str); N]) -> Self {
        entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> TranslationMap {
        TranslationMap::from([("id", "PK_ID"), ("name", "DB_Name")])
    }

    #[test]
    fn lookups() {
        let map = map();
        assert_eq!(map.get("id"), Some("PK_ID"));
        assert!(map.contains("name"));
        assert!(!map.contains("PK_ID"));
        assert_eq!(map.actual_name("name"), "DB_Name");
        assert_eq!(map.actual_name("other"), "other");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn declaration_order() {
        let map: TranslationMap = [("z", "Z"), ("a", "A"), ("z", "ZZ")].into_iter().collect();
        assert_eq!(map.desired_names().collect::<Vec<_>>(), vec!["z", "a"]);
        assert_eq!(map.get("z"), Some("ZZ"));
    }

    #[test]
    fn inverse() {
        let map = map();
        let inverse = map.inverse();
        assert_eq!(inverse.get("PK_ID"), Some(&"id"));
        assert_eq!(inverse.get("DB_Name"), Some(&"name"));
        assert!(map.is_invertible());

        let shared = TranslationMap::from([("a", "X"), ("b", "X")]);
        assert!(!shared.is_invertible());
    }

    #[test]
    fn json_keeps_document_order() {
        let map: TranslationMap =
            serde_json::from_str(r#"{"name": "DB_Name", "id": "PK_ID", "name": "DB_Label"}"#)
                .unwrap();
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![("name", "DB_Label"), ("id", "PK_ID")]);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"name":"DB_Label","id":"PK_ID"}"#);
    }

    #[test]
    fn json_rejects_non_string_columns() {
        serde_json::from_str::<TranslationMap>(r#"{"id": 1}"#).unwrap_err();
    }
}
