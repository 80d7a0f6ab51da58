//! Storage traits and error types
//!
//! This module defines the trait interface for ledger backends and
//! associated error types.

use crate::state::SeenState;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving the ledger
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("State file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for ledger backends
///
/// A backend must round-trip exactly: `load()` after `save(state)` returns
/// the same identifiers with the same seen-set membership.
pub trait StateStore {
    /// Loads the persisted ledger
    ///
    /// Returns an empty ledger when nothing has been persisted yet. A ledger
    /// that exists but cannot be read is an error, never an empty result.
    fn load(&self) -> StorageResult<SeenState>;

    /// Persists the ledger
    ///
    /// Readers must never observe a partially written ledger.
    fn save(&self, state: &SeenState) -> StorageResult<()>;

    /// Human-readable location of the ledger, for logs
    fn location(&self) -> String;
}
