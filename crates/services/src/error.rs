//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;

/// Errors emitted by `ProgressService`.
///
/// Missing data is not an error: absent slots read as default records,
/// unknown categories and an unset vocabulary yield zero totals. Only
/// backend failures and corrupt stored documents surface here, so callers
/// can decide whether to retry, log, or propagate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
