//! JSON file ledger backend
//!
//! The ledger lives in a single pretty-printed JSON file:
//!
//! ```text
//! {
//!   "seen": {
//!     "1HGCM82633A004352": ["http://a.com/x", "http://b.com/y"]
//!   },
//!   "updated_at": "2026-01-01T00:00:00Z"
//! }
//! ```
//!
//! Deleting the file resets all dedup history.

use crate::state::SeenState;
use crate::storage::traits::{StateStore, StorageError, StorageResult};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Ledger stored as a JSON file on the local filesystem
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the ledger is staged in before the rename
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> StorageResult<SeenState> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(
                    "No state file at {}, starting with an empty ledger",
                    self.path.display()
                );
                return Ok(SeenState::new());
            }
            Err(e) => return Err(self.io_error(&self.path, e)),
        };

        serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, state: &SeenState) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
            }
        }

        let mut bytes = serde_json::to_vec_pretty(state)?;
        bytes.push(b'\n');

        // Stage in a sibling file so the rename stays on one filesystem
        let tmp = self.temp_path();
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            Ok(())
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(&tmp, e));
        }

        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            self.io_error(&self.path, e)
        })?;

        tracing::debug!(
            "Saved {} identifiers ({} URLs) to {}",
            state.identifier_count(),
            state.url_count(),
            self.path.display()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
