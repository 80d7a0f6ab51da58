//! Combines several providers into one result list

use crate::search::{ProviderError, SearchHit, SearchProvider};
use async_trait::async_trait;
use std::time::Duration;

/// Pause between consecutive providers for the same identifier
const DEFAULT_PAUSE: Duration = Duration::from_millis(500);

/// Queries each provider in order and concatenates their hits
///
/// A provider failure is logged and skipped. The search only fails when
/// every provider failed.
pub struct MultiProvider {
    providers: Vec<Box<dyn SearchProvider>>,
    pause: Duration,
}

impl MultiProvider {
    pub fn new(providers: Vec<Box<dyn SearchProvider>>) -> Self {
        Self {
            providers,
            pause: DEFAULT_PAUSE,
        }
    }

    /// Overrides the pause between providers
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }
}

#[async_trait]
impl SearchProvider for MultiProvider {
    fn name(&self) -> &'static str {
        "multi"
    }

    async fn search(&self, identifier: &str) -> Result<Vec<SearchHit>, ProviderError> {
        let mut hits = Vec::new();
        let mut failures = Vec::new();

        for (i, provider) in self.providers.iter().enumerate() {
            if i > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            match provider.search(identifier).await {
                Ok(found) => {
                    tracing::debug!("{} returned {} results", provider.name(), found.len());
                    hits.extend(found);
                }
                Err(e) => {
                    tracing::warn!("{} search for {} failed: {}", provider.name(), identifier, e);
                    failures.push(format!("{}: {}", provider.name(), e));
                }
            }
        }

        if !self.providers.is_empty() && failures.len() == self.providers.len() {
            return Err(ProviderError::AllFailed(failures.join("; ")));
        }

        Ok(hits)
    }
}
