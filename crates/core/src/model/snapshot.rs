use serde::{Deserialize, Serialize};

use crate::model::bookmarks::BookmarkSet;
use crate::model::progress::ProgressRecord;
use crate::model::word::DifficultyMap;

/// Backup/transfer snapshot of the three persisted records.
///
/// Fields absent from an imported snapshot leave the corresponding stored
/// record untouched; an export always fills all three.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmarks: Option<BookmarkSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<DifficultyMap>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_stay_out_of_the_serialized_form() {
        let snapshot = DataSnapshot {
            bookmarks: Some(BookmarkSet::new()),
            ..DataSnapshot::default()
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"bookmarks":[]}"#);

        let parsed: DataSnapshot = serde_json::from_str(&json).unwrap();
        assert!(parsed.progress.is_none());
        assert!(parsed.bookmarks.is_some());
    }
}
