use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// On-disk version tag written into new [`ProgressRecord`]s.
pub const PROGRESS_VERSION: &str = "1";

/// Maximum number of study dates retained; the oldest entries drop first.
pub const STUDY_DATE_CAP: usize = 365;

/// Card identifier: the explicit word id when known, else category + index.
#[must_use]
pub fn card_id(category: &str, word_index: usize, word_id: Option<&str>) -> String {
    match word_id {
        Some(id) => id.to_owned(),
        None => format!("{category}-{word_index}"),
    }
}

/// Completion percentage, rounded to the nearest integer.
///
/// A total of zero normalizes to 0 rather than dividing by zero. Studied
/// counts above the total are reported as-is; the record does not clamp
/// stale totals.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn completion_percent(studied: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((studied as f64 / total as f64) * 100.0).round() as u32
}

//
// ─── CATEGORY STATS ────────────────────────────────────────────────────────────
//

/// Per-category study counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub studied: u32,
    /// Category size captured when the first card in the category was
    /// studied. Not refreshed if the vocabulary changes size later.
    pub total: u32,
    pub last_access: DateTime<Utc>,
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Studied-card ledger persisted to the progress slot.
///
/// `studied_cards` holds every card identifier ever marked studied (no
/// duplicates), `study_dates` the calendar days with at least one study
/// event, ascending and capped at [`STUDY_DATE_CAP`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressRecord {
    pub studied_cards: BTreeSet<String>,
    pub study_dates: Vec<NaiveDate>,
    pub category_stats: BTreeMap<String, CategoryStats>,
    pub last_studied: Option<DateTime<Utc>>,
    pub version: String,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            studied_cards: BTreeSet::new(),
            study_dates: Vec::new(),
            category_stats: BTreeMap::new(),
            last_studied: None,
            version: PROGRESS_VERSION.to_owned(),
        }
    }
}

impl ProgressRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one studied card.
    ///
    /// Returns `false` and leaves the record untouched when the card was
    /// already studied. `category_total` is only consulted when the category
    /// gets its first entry; existing stats keep the total captured back
    /// then.
    pub fn record_study(
        &mut self,
        category: &str,
        card: String,
        category_total: u32,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.studied_cards.insert(card) {
            return false;
        }

        self.last_studied = Some(now);

        let stats = self
            .category_stats
            .entry(category.to_owned())
            .or_insert(CategoryStats {
                studied: 0,
                total: category_total,
                last_access: now,
            });
        stats.studied += 1;
        stats.last_access = now;

        self.record_study_date(now.date_naive());
        true
    }

    /// Appends `day` unless already present, then drops the oldest entries
    /// beyond [`STUDY_DATE_CAP`].
    fn record_study_date(&mut self, day: NaiveDate) {
        if self.study_dates.contains(&day) {
            return;
        }
        self.study_dates.push(day);
        if self.study_dates.len() > STUDY_DATE_CAP {
            let excess = self.study_dates.len() - STUDY_DATE_CAP;
            self.study_dates.drain(..excess);
        }
    }

    /// Consecutive study days ending today.
    ///
    /// Walks the date list backward: the most recent entry must be exactly
    /// today, the one before it yesterday, and so on. The first gap ends the
    /// streak. Relies on `study_dates` being ascending and duplicate-free,
    /// which [`ProgressRecord::record_study`] maintains.
    #[must_use]
    pub fn streak(&self, today: NaiveDate) -> u32 {
        let mut streak = 0;
        let mut expected: i64 = 0;
        for day in self.study_dates.iter().rev() {
            if (today - *day).num_days() == expected {
                streak += 1;
                expected += 1;
            } else {
                break;
            }
        }
        streak
    }

    /// Category with the highest studied counter.
    ///
    /// Ties resolve to the alphabetically first category. Returns `None`
    /// while no category has any studied words.
    #[must_use]
    pub fn favorite_category(&self) -> Option<&str> {
        let mut best: Option<(&str, u32)> = None;
        for (name, stats) in &self.category_stats {
            if stats.studied == 0 {
                continue;
            }
            match best {
                Some((_, count)) if stats.studied <= count => {}
                _ => best = Some((name, stats.studied)),
            }
        }
        best.map(|(name, _)| name)
    }

    #[must_use]
    pub fn total_studied(&self) -> usize {
        self.studied_cards.len()
    }

    #[must_use]
    pub fn is_studied(&self, card: &str) -> bool {
        self.studied_cards.contains(card)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn card_id_prefers_word_id() {
        assert_eq!(card_id("animals", 3, None), "animals-3");
        assert_eq!(card_id("animals", 3, Some("dog")), "dog");
    }

    #[test]
    fn completion_percent_guards_zero_total() {
        assert_eq!(completion_percent(0, 0), 0);
        assert_eq!(completion_percent(5, 0), 0);
        assert_eq!(completion_percent(1, 3), 33);
        assert_eq!(completion_percent(2, 3), 67);
        assert_eq!(completion_percent(3, 3), 100);
    }

    #[test]
    fn record_study_is_idempotent_per_card() {
        let mut record = ProgressRecord::new();
        let now = fixed_now();

        assert!(record.record_study("animals", "animals-0".into(), 10, now));
        let after_first = record.clone();

        assert!(!record.record_study("animals", "animals-0".into(), 10, now));
        assert_eq!(record, after_first);
        assert_eq!(record.category_stats["animals"].studied, 1);
    }

    #[test]
    fn existing_stats_keep_their_total() {
        let mut record = ProgressRecord::new();
        let now = fixed_now();

        record.record_study("animals", "animals-0".into(), 10, now);
        // the vocabulary grew, but the cached total stays
        record.record_study("animals", "animals-1".into(), 12, now);

        let stats = &record.category_stats["animals"];
        assert_eq!(stats.studied, 2);
        assert_eq!(stats.total, 10);
    }

    #[test]
    fn study_dates_deduplicate_within_a_day() {
        let mut record = ProgressRecord::new();
        let now = fixed_now();

        record.record_study("animals", "animals-0".into(), 10, now);
        record.record_study("animals", "animals-1".into(), 10, now + Duration::hours(2));

        assert_eq!(record.study_dates.len(), 1);
    }

    #[test]
    fn study_dates_cap_drops_oldest_first() {
        let mut record = ProgressRecord::new();
        let start = fixed_now();

        for offset in 0..(STUDY_DATE_CAP as i64 + 5) {
            let at = start + Duration::days(offset);
            record.record_study("animals", format!("animals-{offset}"), 500, at);
        }

        assert_eq!(record.study_dates.len(), STUDY_DATE_CAP);
        assert_eq!(
            record.study_dates[0],
            (start + Duration::days(5)).date_naive()
        );
    }

    #[test]
    fn streak_counts_consecutive_days_ending_today() {
        let today = fixed_now().date_naive();
        let mut record = ProgressRecord::new();
        record.study_dates = vec![
            today - Duration::days(2),
            today - Duration::days(1),
            today,
        ];
        assert_eq!(record.streak(today), 3);
    }

    #[test]
    fn streak_breaks_on_a_gap() {
        let today = fixed_now().date_naive();
        let mut record = ProgressRecord::new();
        record.study_dates = vec![today - Duration::days(5), today];
        assert_eq!(record.streak(today), 1);
    }

    #[test]
    fn streak_is_zero_without_a_study_today() {
        let today = fixed_now().date_naive();

        let record = ProgressRecord::new();
        assert_eq!(record.streak(today), 0);

        let mut record = ProgressRecord::new();
        record.study_dates = vec![today - Duration::days(1)];
        assert_eq!(record.streak(today), 0);
    }

    #[test]
    fn favorite_category_ties_resolve_alphabetically() {
        let mut record = ProgressRecord::new();
        let now = fixed_now();

        assert_eq!(record.favorite_category(), None);

        record.record_study("food", "food-0".into(), 5, now);
        record.record_study("animals", "animals-0".into(), 5, now);
        assert_eq!(record.favorite_category(), Some("animals"));

        record.record_study("food", "food-1".into(), 5, now);
        assert_eq!(record.favorite_category(), Some("food"));
    }
}
