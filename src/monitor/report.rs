//! Outcome of a run, for logs and the process exit status

use chrono::{DateTime, Utc};

/// What happened to one identifier during the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierStatus {
    /// The provider answered; `new_urls` may be empty
    Searched {
        results: usize,
        new_urls: Vec<String>,
        baseline: bool,
    },

    /// The provider failed or timed out; the identifier was skipped
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierOutcome {
    pub identifier: String,
    pub status: IdentifierStatus,
}

/// Whether the run's notification went out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    /// Nothing new, so nothing was sent
    NotNeeded,

    Delivered { channel: &'static str },

    /// Delivery failed; the alerted URLs were left unseen for the next run
    Failed { error: String },
}

/// Summary of one completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<IdentifierOutcome>,
    pub notification: NotificationStatus,
    /// Where the ledger was saved
    pub state_location: String,
}

impl RunReport {
    /// Identifiers whose search failed
    pub fn failed(&self) -> Vec<&IdentifierOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, IdentifierStatus::Failed { .. }))
            .collect()
    }

    /// New URLs found for an identifier (empty if none or failed)
    pub fn new_urls(&self, identifier: &str) -> &[String] {
        self.outcomes
            .iter()
            .find(|o| o.identifier == identifier)
            .and_then(|o| match &o.status {
                IdentifierStatus::Searched { new_urls, .. } => Some(new_urls.as_slice()),
                IdentifierStatus::Failed { .. } => None,
            })
            .unwrap_or(&[])
    }

    /// Total new URLs across identifiers
    pub fn new_url_count(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match &o.status {
                IdentifierStatus::Searched { new_urls, .. } => new_urls.len(),
                IdentifierStatus::Failed { .. } => 0,
            })
            .sum()
    }

    /// True if every identifier failed
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.failed().len() == self.outcomes.len()
    }

    /// Process exit code: non-zero only when no identifier could be searched
    pub fn exit_code(&self) -> u8 {
        if self.all_failed() {
            1
        } else {
            0
        }
    }
}

/// Prints a run report to stdout in a formatted manner
pub fn print_report(report: &RunReport) {
    println!("=== vin-watch run ===\n");

    for outcome in &report.outcomes {
        match &outcome.status {
            IdentifierStatus::Searched {
                results,
                new_urls,
                baseline,
            } => {
                let note = if *baseline { " (baseline)" } else { "" };
                println!(
                    "  {}: {} results, {} new{}",
                    outcome.identifier,
                    results,
                    new_urls.len(),
                    note
                );
                for url in new_urls {
                    println!("    + {}", url);
                }
            }
            IdentifierStatus::Failed { error } => {
                println!("  {}: FAILED ({})", outcome.identifier, error);
            }
        }
    }
    println!();

    match &report.notification {
        NotificationStatus::NotNeeded => println!("Notification: nothing new"),
        NotificationStatus::Delivered { channel } => {
            println!("Notification: delivered via {}", channel)
        }
        NotificationStatus::Failed { error } => {
            println!("Notification: FAILED ({}); matches will be re-sent next run", error)
        }
    }

    let elapsed = report.finished_at - report.started_at;
    println!(
        "State saved to {} ({} failed, {} new, {:.1}s)",
        report.state_location,
        report.failed().len(),
        report.new_url_count(),
        elapsed.num_milliseconds() as f64 / 1000.0
    );
}
