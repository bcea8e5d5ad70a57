use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Set of bookmarked word keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkSet(BTreeSet<String>);

impl BookmarkSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles a word key; returns whether the key is bookmarked afterwards.
    pub fn toggle(&mut self, key: String) -> bool {
        if self.0.remove(&key) {
            false
        } else {
            self.0.insert(key);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_is_an_involution() {
        let mut bookmarks = BookmarkSet::new();
        let before = bookmarks.clone();

        assert!(bookmarks.toggle("dog-pies".to_string()));
        assert!(bookmarks.contains("dog-pies"));

        assert!(!bookmarks.toggle("dog-pies".to_string()));
        assert_eq!(bookmarks, before);
    }

    #[test]
    fn toggle_only_touches_its_own_key() {
        let mut bookmarks = BookmarkSet::new();
        bookmarks.toggle("cat-kot".to_string());
        bookmarks.toggle("dog-pies".to_string());
        bookmarks.toggle("cat-kot".to_string());

        assert!(!bookmarks.contains("cat-kot"));
        assert!(bookmarks.contains("dog-pies"));
        assert_eq!(bookmarks.len(), 1);
    }
}
