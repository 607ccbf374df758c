use thiserror::Error;

use orderflow_core::DomainError;

use crate::ledger::LedgerStoreError;

/// Failure of an engine operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business rule rejection; nothing was written.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The ledger refused the write (stale version, duplicate key) or is unusable.
    #[error(transparent)]
    Store(#[from] LedgerStoreError),

    /// An event payload could not be encoded; nothing was written.
    #[error("event serialization failed: {0}")]
    Serialization(String),

    /// The ledger committed but publication failed (at-least-once; a retry may duplicate).
    #[error("event publication failed: {0}")]
    Publish(String),
}

impl ServiceError {
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) => Some(e),
            _ => None,
        }
    }
}
