//! Decision table rows.

use indexmap::IndexMap;
use serde::Serialize;

/// A link to a decision page found on the listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionLink {
    pub url: String,
    pub title: String,
}

/// One row of a decision page's data table, keyed by header text.
///
/// Fields keep insertion order so logged JSON reads like the source table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DecisionRecord {
    fields: IndexMap<String, String>,
}

impl DecisionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Set a field. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Remove a field, keeping the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.fields.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_position() {
        let mut record = DecisionRecord::new();
        record.insert("a", "1");
        record.insert("b", "2");
        record.insert("a", "3");

        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(record.get("a"), Some("3"));
    }

    #[test]
    fn test_remove_keeps_order_of_rest() {
        let mut record = DecisionRecord::new();
        record.insert("a", "1");
        record.insert("b", "2");
        record.insert("c", "3");

        assert_eq!(record.remove("a"), Some("1".to_string()));
        assert_eq!(record.remove("missing"), None);
        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "c"]);
        assert!(!record.contains("a"));
    }

    #[test]
    fn test_serializes_in_order() {
        let mut record = DecisionRecord::new();
        record.insert("Licensee", "Rogers");
        record.insert("Frequency range (MHz)", "470-512");
        record.insert("Table Title", "Transfer");

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"Licensee":"Rogers","Frequency range (MHz)":"470-512","Table Title":"Transfer"}"#
        );
    }
}
