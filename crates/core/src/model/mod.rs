mod bookmarks;
mod progress;
mod snapshot;
mod vocabulary;
mod word;

pub use bookmarks::BookmarkSet;
pub use progress::{
    CategoryStats, PROGRESS_VERSION, ProgressRecord, STUDY_DATE_CAP, card_id, completion_percent,
};
pub use snapshot::DataSnapshot;
pub use vocabulary::Vocabulary;
pub use word::{Difficulty, DifficultyMap, ParseDifficultyError, Word};
