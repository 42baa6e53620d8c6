use std::collections::{BTreeMap, HashMap};

/// A parsed `KEY=VALUE` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    /// 1-based line on which the key starts.
    pub line: u32,
}

/// Ordered mapping from key to value.
///
/// Assigning an existing key replaces its value in place, so iteration order
/// is the order in which distinct keys were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    entries: Vec<Entry>,
    by_key: HashMap<String, usize>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entry(key).map(|entry| entry.value.as_str())
    }

    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.by_key.get(key).map(|&idx| &self.entries[idx])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    /// Insert an entry, overwriting any earlier assignment to the same key.
    pub fn insert(&mut self, entry: Entry) {
        if let Some(existing_idx) = self.by_key.get(&entry.key).copied() {
            self.entries[existing_idx] = entry;
        } else {
            self.by_key.insert(entry.key.clone(), self.entries.len());
            self.entries.push(entry);
        }
    }

    pub(crate) fn set_value(&mut self, key: &str, value: String) {
        if let Some(&idx) = self.by_key.get(key) {
            self.entries[idx].value = value;
        }
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect()
    }
}

impl IntoIterator for Env {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Env {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Where the scanner resumes after a line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Resume at the statement rule. Blank lines, indented lines and
    /// comment-only lines after the first line are rejected.
    #[default]
    Strict,
    /// Resume at the line rule, which skips indentation and accepts blank and
    /// comment-only lines anywhere in the input.
    Relaxed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: &str, line: u32) -> Entry {
        Entry {
            key: key.to_owned(),
            value: value.to_owned(),
            line,
        }
    }

    #[test]
    fn reassignment_keeps_first_position() {
        let mut env = Env::new();
        env.insert(entry("A", "1", 1));
        env.insert(entry("B", "2", 2));
        env.insert(entry("A", "3", 3));

        assert_eq!(env.len(), 2);
        assert_eq!(env.keys().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(env.get("A"), Some("3"));
        assert_eq!(env.entry("A").map(|e| e.line), Some(3));
    }

    #[test]
    fn set_value_ignores_unknown_keys() {
        let mut env = Env::new();
        env.insert(entry("A", "1", 1));
        env.set_value("A", "changed".to_owned());
        env.set_value("MISSING", "x".to_owned());

        assert_eq!(env.get("A"), Some("changed"));
        assert!(!env.contains_key("MISSING"));
    }

    #[test]
    fn to_map_collects_pairs() {
        let mut env = Env::new();
        env.insert(entry("B", "2", 1));
        env.insert(entry("A", "1", 2));

        let map = env.to_map();
        assert_eq!(map.get("A").map(String::as_str), Some("1"));
        assert_eq!(map.get("B").map(String::as_str), Some("2"));
    }
}
