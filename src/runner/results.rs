//! Ordered `task id -> outcome` map produced by a run.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Task outcomes in execution order.
///
/// Built incrementally by the runner, then handed to notifiers by shared
/// reference so it cannot change during fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskResults {
    entries: Vec<(String, bool)>,
}

impl TaskResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome. Re-recording an id replaces it in place.
    pub fn insert(&mut self, id: impl Into<String>, success: bool) {
        let id = id.into();
        match self.entries.iter_mut().find(|(k, _)| *k == id) {
            Some(entry) => entry.1 = success,
            None => self.entries.push((id, success)),
        }
    }

    pub fn get(&self, id: &str) -> Option<bool> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, v)| *v)
    }

    /// `true` only when `id` ran and succeeded.
    pub fn is_success(&self, id: &str) -> bool {
        self.get(id).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[cfg(test)]
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|(_, v)| *v).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for TaskResults {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        let mut results = Self::new();
        for (k, v) in iter {
            results.insert(k, v);
        }
        results
    }
}

impl Serialize for TaskResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_kept() {
        let results: TaskResults = [("b", true), ("a", false), ("c", true)].into_iter().collect();
        assert_eq!(results.ids().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_counts() {
        let results: TaskResults = [("x", true), ("y", false), ("z", true)].into_iter().collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results.succeeded(), 2);
        assert_eq!(results.failed(), 1);
    }

    #[test]
    fn test_empty() {
        let results = TaskResults::new();
        assert!(results.is_empty());
        assert_eq!(results.succeeded(), 0);
        assert_eq!(results.failed(), 0);
    }

    #[test]
    fn test_reinsert_replaces_in_place() {
        let mut results = TaskResults::new();
        results.insert("a", true);
        results.insert("b", true);
        results.insert("a", false);
        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().collect::<Vec<_>>(), vec![("a", false), ("b", true)]);
    }

    #[test]
    fn test_is_success() {
        let results: TaskResults = [("ai_news", true), ("tech_insights", false)].into_iter().collect();
        assert!(results.is_success("ai_news"));
        assert!(!results.is_success("tech_insights"));
        assert!(!results.is_success("never_ran"));
        assert_eq!(results.get("never_ran"), None);
    }

    #[test]
    fn test_serializes_as_ordered_object() {
        let results: TaskResults = [("z", true), ("a", false)].into_iter().collect();
        assert_eq!(serde_json::to_string(&results).unwrap(), r#"{"z":true,"a":false}"#);
    }
}
