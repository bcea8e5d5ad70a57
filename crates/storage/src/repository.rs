use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use fiszki_core::model::{BookmarkSet, DifficultyMap, ProgressRecord};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── SLOTS ─────────────────────────────────────────────────────────────────────
//

/// The three persisted records, each living in its own storage slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateSlot {
    Progress,
    Bookmarks,
    Difficulty,
}

impl StateSlot {
    /// Every slot, in a stable order. Useful for reset paths.
    pub const ALL: [StateSlot; 3] = [
        StateSlot::Progress,
        StateSlot::Bookmarks,
        StateSlot::Difficulty,
    ];

    /// Namespaced key under which the slot is stored.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            StateSlot::Progress => "fiszki.progress",
            StateSlot::Bookmarks => "fiszki.bookmarks",
            StateSlot::Difficulty => "fiszki.difficulty",
        }
    }
}

impl fmt::Display for StateSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateSlot::Progress => "progress",
            StateSlot::Bookmarks => "bookmarks",
            StateSlot::Difficulty => "difficulty",
        };
        f.write_str(name)
    }
}

//
// ─── REPOSITORY CONTRACT ───────────────────────────────────────────────────────
//

/// Raw persistence contract: independent string-keyed slots holding JSON
/// documents.
///
/// Reads return absent-or-value, writes overwrite the whole document, and
/// clear removes the slot entirely. Any key-value backend with these
/// semantics satisfies the contract. There is no transactional isolation
/// across slots; concurrent writers get last-write-wins.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Fetch the stored document for a slot, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn load(&self, slot: StateSlot) -> Result<Option<String>, StorageError>;

    /// Overwrite the slot with a new document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn save(&self, slot: StateSlot, value: &str) -> Result<(), StorageError>;

    /// Remove the slot entirely. Clearing an absent slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear(&self, slot: StateSlot) -> Result<(), StorageError>;
}

/// Simple in-memory backend for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    slots: Arc<Mutex<HashMap<&'static str, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl StateRepository for InMemoryRepository {
    async fn load(&self, slot: StateSlot) -> Result<Option<String>, StorageError> {
        let guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(slot.key()).cloned())
    }

    async fn save(&self, slot: StateSlot, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(slot.key(), value.to_owned());
        Ok(())
    }

    async fn clear(&self, slot: StateSlot) -> Result<(), StorageError> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(slot.key());
        Ok(())
    }
}

//
// ─── TYPED FACADE ──────────────────────────────────────────────────────────────
//

/// Typed facade over a [`StateRepository`] backend.
///
/// Owns the JSON mapping between domain records and stored documents so
/// neither side leaks into the other. Every save overwrites the whole
/// record; there are no partial updates.
#[derive(Clone)]
pub struct StateStore {
    backend: Arc<dyn StateRepository>,
}

impl StateStore {
    #[must_use]
    pub fn new(backend: Arc<dyn StateRepository>) -> Self {
        Self { backend }
    }

    /// Build a store backed by the in-memory repository.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRepository::new()))
    }

    async fn load_json<T: DeserializeOwned>(
        &self,
        slot: StateSlot,
    ) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.backend.load(slot).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(slot = %slot, error = %err, "stored record is corrupt");
                Err(StorageError::Serialization(err.to_string()))
            }
        }
    }

    async fn save_json<T: Serialize>(
        &self,
        slot: StateSlot,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.backend.save(slot, &raw).await
    }

    /// Stored progress record, or `None` when nothing was persisted yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for corrupt stored JSON, or
    /// other storage errors from the backend.
    pub async fn load_progress(&self) -> Result<Option<ProgressRecord>, StorageError> {
        self.load_json(StateSlot::Progress).await
    }

    /// Overwrite the stored progress record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the backend write fails.
    pub async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        self.save_json(StateSlot::Progress, record).await
    }

    /// Stored bookmark set, or `None` when nothing was persisted yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for corrupt stored JSON, or
    /// other storage errors from the backend.
    pub async fn load_bookmarks(&self) -> Result<Option<BookmarkSet>, StorageError> {
        self.load_json(StateSlot::Bookmarks).await
    }

    /// Overwrite the stored bookmark set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the backend write fails.
    pub async fn save_bookmarks(&self, bookmarks: &BookmarkSet) -> Result<(), StorageError> {
        self.save_json(StateSlot::Bookmarks, bookmarks).await
    }

    /// Stored difficulty overrides, or `None` when nothing was persisted yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for corrupt stored JSON, or
    /// other storage errors from the backend.
    pub async fn load_difficulty(&self) -> Result<Option<DifficultyMap>, StorageError> {
        self.load_json(StateSlot::Difficulty).await
    }

    /// Overwrite the stored difficulty overrides.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the backend write fails.
    pub async fn save_difficulty(&self, overrides: &DifficultyMap) -> Result<(), StorageError> {
        self.save_json(StateSlot::Difficulty, overrides).await
    }

    /// Remove a single slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn clear(&self, slot: StateSlot) -> Result<(), StorageError> {
        self.backend.clear(slot).await
    }

    /// Remove all three slots, reverting every record to its default on the
    /// next read.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        for slot in StateSlot::ALL {
            self.backend.clear(slot).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiszki_core::time::fixed_now;

    #[tokio::test]
    async fn absent_slots_load_as_none() {
        let store = StateStore::in_memory();
        assert!(store.load_progress().await.unwrap().is_none());
        assert!(store.load_bookmarks().await.unwrap().is_none());
        assert!(store.load_difficulty().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn progress_roundtrips_through_the_store() {
        let store = StateStore::in_memory();

        let mut record = ProgressRecord::new();
        record.record_study("animals", "animals-0".into(), 10, fixed_now());
        store.save_progress(&record).await.unwrap();

        let loaded = store.load_progress().await.unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn corrupt_documents_surface_serialization_errors() {
        let backend = InMemoryRepository::new();
        backend
            .save(StateSlot::Progress, "{not valid json")
            .await
            .unwrap();

        let store = StateStore::new(Arc::new(backend));
        let err = store.load_progress().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn clear_all_empties_every_slot() {
        let store = StateStore::in_memory();
        store.save_progress(&ProgressRecord::new()).await.unwrap();
        store.save_bookmarks(&BookmarkSet::new()).await.unwrap();
        store.save_difficulty(&DifficultyMap::new()).await.unwrap();

        store.clear_all().await.unwrap();

        assert!(store.load_progress().await.unwrap().is_none());
        assert!(store.load_bookmarks().await.unwrap().is_none());
        assert!(store.load_difficulty().await.unwrap().is_none());
    }
}
