//! Session error type.

use roster_core::RosterError;
use roster_docstore::StoreError;
use thiserror::Error;

/// Errors surfaced to the caller of a session operation.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Roster(#[from] RosterError),

    /// A record could not be encoded for the store.
    #[error("failed to encode change record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SessionError {
    /// Returns true if the error came from the store rather than the request.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
