//! Run orchestration
//!
//! This module contains the single-run flow:
//! - Loading the ledger
//! - Searching each identifier independently
//! - Diffing results against the ledger
//! - Sending one consolidated notification
//! - Persisting the ledger exactly once

mod coordinator;
mod report;

pub use coordinator::Monitor;
pub use report::{print_report, IdentifierOutcome, IdentifierStatus, NotificationStatus, RunReport};

use crate::config::Config;
use crate::VinError;

/// Runs one complete monitoring pass
///
/// This is the main entry point for a scheduled invocation. It will:
/// 1. Build the search provider, notifier and ledger store from `config`
/// 2. Search every identifier and diff the results
/// 3. Notify once if anything new was found
/// 4. Save the ledger
///
/// # Returns
///
/// * `Ok(RunReport)` - The run completed and the ledger was saved
/// * `Err(VinError)` - The ledger could not be loaded or saved
pub async fn run_once(config: Config) -> Result<RunReport, VinError> {
    let monitor = Monitor::from_config(config)?;
    monitor.run().await
}
