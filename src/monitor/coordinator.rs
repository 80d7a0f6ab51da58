//! Monitor - main run orchestration logic
//!
//! One run loads the ledger, searches every identifier in turn, diffs the
//! results, sends a single consolidated alert, and saves the ledger once.
//! A failure for one identifier never stops the others.

use crate::config::Config;
use crate::diff::compute_new;
use crate::monitor::report::{IdentifierOutcome, IdentifierStatus, NotificationStatus, RunReport};
use crate::notify::{build_notifier, AlertMatch, AlertSummary, Notifier, NotifyError};
use crate::search::{build_provider, ProviderError, SearchHit, SearchProvider};
use crate::state::BaselinePolicy;
use crate::storage::{JsonFileStore, StateStore};
use crate::url::normalize_url;
use crate::VinError;
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::timeout;

/// Main run coordinator
pub struct Monitor {
    identifiers: Vec<String>,
    baseline: BaselinePolicy,
    provider: Box<dyn SearchProvider>,
    notifier: Box<dyn Notifier>,
    store: Box<dyn StateStore>,
    search_timeout: Duration,
    notify_timeout: Duration,
}

impl Monitor {
    /// Creates a monitor from its collaborators
    ///
    /// Timeouts default to 30 seconds per search and per notification.
    pub fn new(
        identifiers: Vec<String>,
        baseline: BaselinePolicy,
        provider: Box<dyn SearchProvider>,
        notifier: Box<dyn Notifier>,
        store: Box<dyn StateStore>,
    ) -> Self {
        Self {
            identifiers,
            baseline,
            provider,
            notifier,
            store,
            search_timeout: Duration::from_secs(30),
            notify_timeout: Duration::from_secs(30),
        }
    }

    /// Overrides the per-call timeouts
    pub fn with_timeouts(mut self, search: Duration, notify: Duration) -> Self {
        self.search_timeout = search;
        self.notify_timeout = notify;
        self
    }

    /// Builds a monitor with the providers, channels and ledger named in `config`
    pub fn from_config(config: Config) -> Result<Self, VinError> {
        let provider = build_provider(&config.search)?;
        let notifier = build_notifier(&config.notify)?;
        let store = JsonFileStore::new(config.state_path.clone());

        // Each provider and channel is bounded by its own client timeout; the
        // outer bound covers running them back to back
        let providers = config.search.providers.len().max(1) as u64;
        let search_timeout = Duration::from_secs(
            config
                .search
                .timeout_secs
                .saturating_mul(providers)
                .saturating_add(providers),
        );

        let channels = [config.notify.email.is_some(), config.notify.slack.is_some()]
            .iter()
            .filter(|c| **c)
            .count()
            .max(1) as u64;
        let notify_timeout = Duration::from_secs(
            config
                .notify
                .timeout_secs
                .saturating_mul(channels)
                .saturating_add(1),
        );

        tracing::info!(
            "Watching {} VINs with {} (baseline policy: {})",
            config.identifiers.len(),
            provider.name(),
            config.baseline
        );

        Ok(Self::new(
            config.identifiers,
            config.baseline,
            provider,
            notifier,
            Box::new(store),
        )
        .with_timeouts(search_timeout, notify_timeout))
    }

    /// Runs one monitoring pass
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - The ledger was saved; individual identifiers or the
    ///   notification may still have failed
    /// * `Err(VinError)` - The ledger could not be loaded or saved
    pub async fn run(&self) -> Result<RunReport, VinError> {
        let started_at = Utc::now();

        let loaded = self.store.load().map_err(|e| {
            tracing::error!("Failed to load state from {}: {}", self.store.location(), e);
            e
        })?;
        tracing::info!(
            "Loaded {} identifiers ({} seen URLs) from {}",
            loaded.identifier_count(),
            loaded.url_count(),
            self.store.location()
        );

        let mut state = loaded.clone();
        let mut outcomes = Vec::with_capacity(self.identifiers.len());
        let mut summary = AlertSummary::new();

        for identifier in &self.identifiers {
            tracing::info!("Searching for VIN: {}", identifier);

            let hits = match self.search(identifier).await {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", identifier, e);
                    outcomes.push(IdentifierOutcome {
                        identifier: identifier.clone(),
                        status: IdentifierStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                    continue;
                }
            };

            let urls: Vec<&str> = hits.iter().map(|h| h.url.as_str()).collect();
            let diff = compute_new(identifier, &urls, state, self.baseline);
            state = diff.state;

            if diff.new_urls.is_empty() {
                tracing::info!(
                    "No NEW matches for {} ({} results scanned)",
                    identifier,
                    hits.len()
                );
            } else {
                tracing::info!(
                    "{} new matches for {} ({} results scanned)",
                    diff.new_urls.len(),
                    identifier,
                    hits.len()
                );
                summary.push(identifier, alert_matches(&diff.new_urls, &hits));
            }

            outcomes.push(IdentifierOutcome {
                identifier: identifier.clone(),
                status: IdentifierStatus::Searched {
                    results: hits.len(),
                    new_urls: diff.new_urls,
                    baseline: diff.baseline,
                },
            });
        }

        let notification = if summary.is_empty() {
            NotificationStatus::NotNeeded
        } else {
            match self.notify(&summary).await {
                Ok(()) => NotificationStatus::Delivered {
                    channel: self.notifier.name(),
                },
                Err(e) => {
                    tracing::error!(
                        "Notification failed, leaving {} matches unseen: {}",
                        summary.match_count(),
                        e
                    );
                    for identifier in summary.identifiers() {
                        state.restore_from(&loaded, identifier);
                    }
                    NotificationStatus::Failed {
                        error: e.to_string(),
                    }
                }
            }
        };

        state.touch();
        self.store.save(&state).map_err(|e| {
            tracing::error!("Failed to save state to {}: {}", self.store.location(), e);
            e
        })?;

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
            notification,
            state_location: self.store.location(),
        };

        if report.all_failed() {
            tracing::error!("Search failed for every identifier");
        }

        Ok(report)
    }

    async fn search(&self, identifier: &str) -> Result<Vec<SearchHit>, ProviderError> {
        match timeout(self.search_timeout, self.provider.search(identifier)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.search_timeout)),
        }
    }

    async fn notify(&self, summary: &AlertSummary) -> Result<(), NotifyError> {
        match timeout(self.notify_timeout, self.notifier.notify(summary)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(self.notify_timeout)),
        }
    }
}

/// Pairs each new URL with the first hit that normalized to it
fn alert_matches(new_urls: &[String], hits: &[SearchHit]) -> Vec<AlertMatch> {
    let mut by_key: HashMap<String, &SearchHit> = HashMap::new();
    for hit in hits {
        by_key.entry(normalize_url(&hit.url)).or_insert(hit);
    }

    new_urls
        .iter()
        .map(|url| match by_key.get(url) {
            Some(hit) => AlertMatch::from_hit(url.clone(), hit),
            None => AlertMatch::bare(url.clone()),
        })
        .collect()
}
