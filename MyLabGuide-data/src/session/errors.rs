use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by session store implementations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionStoreError {
    /// No live session exists for the given identifier.
    #[error("Session not found: {0}")]
    NotFound(Uuid),

    /// The store's mutex was poisoned.
    #[error("Failed to acquire lock: {0}")]
    MutexLock(String),
}
