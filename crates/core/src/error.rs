//! Storage error shared by every store trait.

use thiserror::Error;

/// Failure reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Transient contention (lock timeout, serialization failure). Safe to retry.
    #[error("storage is busy")]
    Busy,

    /// The backend could not be reached or rejected the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint was violated.
    #[error("record already exists")]
    Duplicate,

    /// The addressed record does not exist.
    #[error("record not found")]
    NotFound,

    /// A stored value could not be mapped back into a domain type.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Returns true if repeating the same call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Busy)
    }
}
