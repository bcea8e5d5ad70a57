use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::word::Word;

/// Externally owned word lists, grouped by category name.
///
/// The progress layer treats this as read-only reference data: it looks up
/// category names and list lengths but never mutates the contents.
/// Categories iterate in alphabetical order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary(BTreeMap<String, Vec<Word>>);

impl Vocabulary {
    #[must_use]
    pub fn new(categories: BTreeMap<String, Vec<Word>>) -> Self {
        Self(categories)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Words in a category, or `None` for an unknown category.
    #[must_use]
    pub fn words(&self, category: &str) -> Option<&[Word]> {
        self.0.get(category).map(Vec::as_slice)
    }

    /// Number of words in a category; unknown categories count as empty.
    #[must_use]
    pub fn category_size(&self, category: &str) -> usize {
        self.0.get(category).map_or(0, Vec::len)
    }

    /// Total number of words across all categories.
    #[must_use]
    pub fn total_words(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
