//! Domain errors for the eolwatch resolution engine.

use thiserror::Error;

/// Errors produced by a lifecycle knowledge source.
///
/// The dispatcher recovers all of these locally as "no answer"; they never
/// propagate past it.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source timed out after {0} ms")]
    Timeout(u64),

    #[error("source request failed: {0}")]
    Request(String),

    #[error("source returned a malformed payload: {0}")]
    Malformed(String),
}

/// Result type for lifecycle source queries.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors produced by the durable (L2) entry store.
///
/// An `Unavailable` store degrades the cache to L1-only; it is never fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("durable store unavailable: {0}")]
    Unavailable(String),

    #[error("stored entry could not be decoded: {0}")]
    Decode(String),
}

/// Result type for durable store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Errors produced by an inventory provider during a discovery pass.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("inventory scan failed: {0}")]
    Scan(String),
}

/// Result type for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;
