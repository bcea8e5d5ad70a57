use fiszki_core::Clock;
use fiszki_core::model::{
    BookmarkSet, DataSnapshot, Difficulty, DifficultyMap, ProgressRecord, Vocabulary, Word,
    card_id, completion_percent,
};
use storage::repository::StateStore;
use tracing::info;

use crate::error::ProgressError;

//
// ─── VIEWS ─────────────────────────────────────────────────────────────────────
//

/// Progress within a single category, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryProgress {
    pub studied: u32,
    pub total: u32,
    pub percentage: u32,
}

/// Aggregated progress across every category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverallStats {
    pub total_studied: usize,
    pub total_words: usize,
    pub study_streak: u32,
    pub favorite_category: Option<String>,
    pub studied_percentage: u32,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Orchestrates persistence of study progress, bookmarks, and difficulty
/// overrides.
///
/// Every operation is a full read-modify-write against the injected
/// [`StateStore`]; there is no isolation across callers, so concurrent
/// writers get last-write-wins. The vocabulary is read-only reference data
/// used for totals; without one, totals resolve to zero and percentages
/// to 0%.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    store: StateStore,
    vocabulary: Vocabulary,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, store: StateStore) -> Self {
        Self {
            clock,
            store,
            vocabulary: Vocabulary::default(),
        }
    }

    /// Injects the read-only vocabulary used for totals and percentages.
    pub fn set_vocabulary(&mut self, vocabulary: Vocabulary) {
        self.vocabulary = vocabulary;
    }

    async fn progress(&self) -> Result<ProgressRecord, ProgressError> {
        Ok(self.store.load_progress().await?.unwrap_or_default())
    }

    async fn bookmarks(&self) -> Result<BookmarkSet, ProgressError> {
        Ok(self.store.load_bookmarks().await?.unwrap_or_default())
    }

    async fn difficulty(&self) -> Result<DifficultyMap, ProgressError> {
        Ok(self.store.load_difficulty().await?.unwrap_or_default())
    }

    fn category_total(&self, category: &str) -> u32 {
        u32::try_from(self.vocabulary.category_size(category)).unwrap_or(u32::MAX)
    }

    /// Records one studied card.
    ///
    /// The card identifier is `word_id` when given, else derived from the
    /// category and word index. Returns `false` without writing anything
    /// when the card was already recorded.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the record cannot be read or
    /// persisted.
    pub async fn mark_studied(
        &self,
        category: &str,
        word_index: usize,
        word_id: Option<&str>,
    ) -> Result<bool, ProgressError> {
        let mut record = self.progress().await?;
        let card = card_id(category, word_index, word_id);
        let total = self.category_total(category);

        if !record.record_study(category, card, total, self.clock.now()) {
            return Ok(false);
        }

        self.store.save_progress(&record).await?;
        Ok(true)
    }

    /// Progress for one category.
    ///
    /// Uses the stored stats when the category has been studied; otherwise
    /// zeros, with the total resolved from the vocabulary.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the record cannot be read.
    pub async fn category_progress(
        &self,
        category: &str,
    ) -> Result<CategoryProgress, ProgressError> {
        let record = self.progress().await?;
        let (studied, total) = match record.category_stats.get(category) {
            Some(stats) => (stats.studied, stats.total),
            None => (0, self.category_total(category)),
        };
        Ok(CategoryProgress {
            studied,
            total,
            percentage: completion_percent(u64::from(studied), u64::from(total)),
        })
    }

    /// Aggregated statistics across all categories.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the record cannot be read.
    pub async fn overall_stats(&self) -> Result<OverallStats, ProgressError> {
        let record = self.progress().await?;
        let total_studied = record.total_studied();
        let total_words = self.vocabulary.total_words();

        Ok(OverallStats {
            total_studied,
            total_words,
            study_streak: record.streak(self.clock.today()),
            favorite_category: record.favorite_category().map(str::to_owned),
            studied_percentage: completion_percent(total_studied as u64, total_words as u64),
        })
    }

    /// Effective difficulty level for a word, without mutating anything.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the overrides cannot be read.
    pub async fn difficulty_for(&self, word: &Word) -> Result<Difficulty, ProgressError> {
        Ok(self.difficulty().await?.level_for(word))
    }

    /// Cycles the word one step through easy → medium → hard and persists
    /// the new level.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the overrides cannot be read or
    /// persisted.
    pub async fn toggle_difficulty(&self, word: &Word) -> Result<Difficulty, ProgressError> {
        let mut overrides = self.difficulty().await?;
        let next = overrides.toggle(word);
        self.store.save_difficulty(&overrides).await?;
        Ok(next)
    }

    /// Toggles a word's bookmark; returns whether it is bookmarked after
    /// the toggle.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the set cannot be read or
    /// persisted.
    pub async fn toggle_bookmark(&self, word: &Word) -> Result<bool, ProgressError> {
        let mut bookmarks = self.bookmarks().await?;
        let bookmarked = bookmarks.toggle(word.key());
        self.store.save_bookmarks(&bookmarks).await?;
        Ok(bookmarked)
    }

    /// Pure lookup; never mutates the set.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the set cannot be read.
    pub async fn is_bookmarked(&self, word: &Word) -> Result<bool, ProgressError> {
        Ok(self.bookmarks().await?.contains(&word.key()))
    }

    /// Snapshot of all three records for backup or transfer.
    ///
    /// Slots that were never written export as default empty records.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if any record cannot be read.
    pub async fn export_data(&self) -> Result<DataSnapshot, ProgressError> {
        Ok(DataSnapshot {
            progress: Some(self.progress().await?),
            bookmarks: Some(self.bookmarks().await?),
            difficulty: Some(self.difficulty().await?),
        })
    }

    /// Overwrites each stored record present in the snapshot, wholesale.
    /// Absent fields leave the corresponding record untouched; no merging.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if a record cannot be persisted.
    pub async fn import_data(&self, snapshot: &DataSnapshot) -> Result<(), ProgressError> {
        if let Some(progress) = &snapshot.progress {
            self.store.save_progress(progress).await?;
        }
        if let Some(bookmarks) = &snapshot.bookmarks {
            self.store.save_bookmarks(bookmarks).await?;
        }
        if let Some(difficulty) = &snapshot.difficulty {
            self.store.save_difficulty(difficulty).await?;
        }
        info!("imported data snapshot");
        Ok(())
    }

    /// Deletes all three stored records; subsequent reads see fresh
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if a slot cannot be cleared.
    pub async fn reset_all(&self) -> Result<(), ProgressError> {
        self.store.clear_all().await?;
        info!("cleared all persisted study state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use fiszki_core::time::fixed_clock;

    fn word(english: &str, polish: &str) -> Word {
        Word {
            id: None,
            english: english.to_string(),
            polish: polish.to_string(),
            difficulty: None,
        }
    }

    fn vocabulary() -> Vocabulary {
        let mut categories = BTreeMap::new();
        categories.insert(
            "animals".to_string(),
            vec![word("dog", "pies"), word("cat", "kot")],
        );
        categories.insert("food".to_string(), vec![word("bread", "chleb")]);
        Vocabulary::new(categories)
    }

    fn service() -> ProgressService {
        let mut svc = ProgressService::new(fixed_clock(), StateStore::in_memory());
        svc.set_vocabulary(vocabulary());
        svc
    }

    #[tokio::test]
    async fn category_progress_before_any_study_uses_vocabulary_totals() {
        let svc = service();
        let progress = svc.category_progress("animals").await.unwrap();
        assert_eq!(progress.studied, 0);
        assert_eq!(progress.total, 2);
        assert_eq!(progress.percentage, 0);
    }

    #[tokio::test]
    async fn category_progress_guards_unknown_categories() {
        let svc = service();
        let progress = svc.category_progress("weather").await.unwrap();
        assert_eq!(progress.total, 0);
        assert_eq!(progress.percentage, 0);
    }

    #[tokio::test]
    async fn mark_studied_updates_counters_and_percentage() {
        let svc = service();

        assert!(svc.mark_studied("animals", 0, None).await.unwrap());
        let progress = svc.category_progress("animals").await.unwrap();
        assert_eq!(progress.studied, 1);
        assert_eq!(progress.total, 2);
        assert_eq!(progress.percentage, 50);
    }

    #[tokio::test]
    async fn mark_studied_is_idempotent() {
        let svc = service();

        assert!(svc.mark_studied("animals", 0, None).await.unwrap());
        assert!(!svc.mark_studied("animals", 0, None).await.unwrap());

        let stats = svc.overall_stats().await.unwrap();
        assert_eq!(stats.total_studied, 1);
    }

    #[tokio::test]
    async fn explicit_word_ids_override_the_derived_identifier() {
        let svc = service();

        assert!(svc.mark_studied("animals", 0, Some("dog")).await.unwrap());
        // same index, different id: a distinct card
        assert!(svc.mark_studied("animals", 0, None).await.unwrap());
        // same id again: a no-op
        assert!(!svc.mark_studied("animals", 1, Some("dog")).await.unwrap());

        let stats = svc.overall_stats().await.unwrap();
        assert_eq!(stats.total_studied, 2);
    }

    #[tokio::test]
    async fn overall_stats_without_vocabulary_normalize_to_zero() {
        let svc = ProgressService::new(fixed_clock(), StateStore::in_memory());
        let stats = svc.overall_stats().await.unwrap();
        assert_eq!(stats.total_words, 0);
        assert_eq!(stats.studied_percentage, 0);
        assert_eq!(stats.favorite_category, None);
    }
}
