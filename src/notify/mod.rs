//! Notification channels for new VIN matches
//!
//! This module handles:
//! - The consolidated alert summary sent once per run
//! - Plain-text rendering of that summary
//! - Delivery over SMTP email, a Slack-compatible webhook, or stdout
//! - Fanning out to several channels

mod console;
mod email;
mod message;
mod multi;
mod slack;

pub use console::ConsoleNotifier;
pub use email::EmailNotifier;
pub use message::{render_body, render_subject};
pub use multi::MultiNotifier;
pub use slack::SlackNotifier;

use crate::config::NotifyConfig;
use crate::search::SearchHit;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from delivering a notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{channel} request failed: {source}")]
    Http {
        channel: &'static str,
        source: reqwest::Error,
    },

    #[error("{channel} returned HTTP {status}")]
    Status { channel: &'static str, status: u16 },

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("notification timed out after {0:?}")]
    Timeout(Duration),

    #[error("every notification channel failed: {0}")]
    AllChannelsFailed(String),
}

/// One new match to report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMatch {
    /// Normalized URL (the dedup key)
    pub url: String,
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub source: Option<String>,
    pub date: Option<String>,
}

impl AlertMatch {
    /// Creates a match with no metadata
    pub fn bare(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            snippet: None,
            source: None,
            date: None,
        }
    }

    /// Creates a match for a normalized URL, copying metadata from the hit
    pub fn from_hit(url: impl Into<String>, hit: &SearchHit) -> Self {
        Self {
            url: url.into(),
            title: hit.title.clone(),
            snippet: hit.snippet.clone(),
            source: Some(hit.source.to_string()),
            date: hit.date.clone(),
        }
    }
}

/// New matches for one identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierAlert {
    pub identifier: String,
    /// Sorted by normalized URL
    pub matches: Vec<AlertMatch>,
}

/// Everything new found in a run, grouped by identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertSummary {
    /// In configured identifier order; identifiers with nothing new are absent
    pub alerts: Vec<IdentifierAlert>,
}

impl AlertSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an identifier's matches; empty match lists are ignored
    pub fn push(&mut self, identifier: &str, matches: Vec<AlertMatch>) {
        if matches.is_empty() {
            return;
        }
        self.alerts.push(IdentifierAlert {
            identifier: identifier.to_string(),
            matches,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Identifiers with new matches
    pub fn identifiers(&self) -> Vec<&str> {
        self.alerts.iter().map(|a| a.identifier.as_str()).collect()
    }

    /// Total number of new matches
    pub fn match_count(&self) -> usize {
        self.alerts.iter().map(|a| a.matches.len()).sum()
    }
}

/// A channel that delivers the run's alert summary
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs
    fn name(&self) -> &'static str;

    /// Delivers the summary
    async fn notify(&self, summary: &AlertSummary) -> Result<(), NotifyError>;
}

/// Builds the notifier for a run
///
/// Every configured channel is used. With none configured, alerts go to
/// stdout.
pub fn build_notifier(config: &NotifyConfig) -> Result<Box<dyn Notifier>, reqwest::Error> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let mut channels: Vec<Box<dyn Notifier>> = Vec::new();

    if let Some(email) = &config.email {
        channels.push(Box::new(EmailNotifier::new(email.clone(), timeout)));
    }

    if let Some(slack) = &config.slack {
        channels.push(Box::new(SlackNotifier::new(
            &slack.webhook_url,
            timeout,
        )?));
    }

    match channels.len() {
        0 => {
            tracing::warn!("No notification channel configured; alerts will be printed only");
            Ok(Box::new(ConsoleNotifier))
        }
        1 => Ok(channels.remove(0)),
        _ => Ok(Box::new(MultiNotifier::new(channels))),
    }
}
