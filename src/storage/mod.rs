//! Storage module for persisting the seen-URL ledger
//!
//! This module handles:
//! - Loading the ledger at run start (empty when no file exists yet)
//! - Refusing to continue on a corrupt ledger instead of resetting it
//! - Atomic write-then-rename saves at run end

mod json_file;
mod traits;

pub use json_file::JsonFileStore;
pub use traits::{StateStore, StorageError, StorageResult};

use crate::state::SeenState;
use std::path::Path;

/// Opens the JSON ledger at the given path
pub fn open_store(path: &Path) -> JsonFileStore {
    JsonFileStore::new(path)
}

/// Per-identifier counts for the `--stats` view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStats {
    /// (identifier, number of seen URLs), sorted by identifier
    pub identifiers: Vec<(String, usize)>,

    /// Total seen URLs
    pub total_urls: usize,

    /// Last write time, RFC 3339
    pub updated_at: Option<String>,
}

/// Summarizes a ledger
pub fn ledger_stats(state: &SeenState) -> LedgerStats {
    LedgerStats {
        identifiers: state
            .seen
            .iter()
            .map(|(id, set)| (id.clone(), set.len()))
            .collect(),
        total_urls: state.url_count(),
        updated_at: state.updated_at.map(|t| t.to_rfc3339()),
    }
}

/// Prints ledger statistics to stdout
pub fn print_ledger_stats(location: &str, stats: &LedgerStats) {
    println!("=== Seen-URL Ledger ===\n");
    println!("State file: {}", location);
    println!(
        "Last updated: {}",
        stats.updated_at.as_deref().unwrap_or("never")
    );
    println!("Identifiers: {}", stats.identifiers.len());
    println!("Seen URLs: {}\n", stats.total_urls);

    for (identifier, count) in &stats.identifiers {
        println!("  {:<20} {} seen", identifier, count);
    }
}
