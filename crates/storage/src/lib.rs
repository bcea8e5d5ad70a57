#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{InMemoryRepository, StateRepository, StateSlot, StateStore, StorageError};
pub use sqlite::{SqliteInitError, SqliteRepository};
