//! Search provider adapters
//!
//! This module handles every call to a web search vendor:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Exact-phrase queries against Bing Web Search and Google Programmable Search
//! - Combining several providers into one result list
//! - Telling a failed search apart from a search with zero results

mod bing;
mod google;
mod multi;

pub use bing::BingProvider;
pub use google::GoogleCseProvider;
pub use multi::MultiProvider;

use crate::config::{ProviderConfig, SearchConfig};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Errors from a single search call
///
/// A search that succeeds with no matches is `Ok(vec![])`, never an error.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        source: reqwest::Error,
    },

    #[error("{provider} returned HTTP {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("{provider} rate limited the request (HTTP 429)")]
    RateLimited { provider: &'static str },

    #[error("{provider} response could not be decoded: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    #[error("search timed out after {0:?}")]
    Timeout(Duration),

    #[error("every provider failed: {0}")]
    AllFailed(String),
}

impl ProviderError {
    /// Classifies a transport error from reqwest
    pub(crate) fn from_reqwest(provider: &'static str, source: reqwest::Error, timeout: Duration) -> Self {
        if source.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Http { provider, source }
        }
    }
}

/// One search result as returned by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Result URL exactly as the provider returned it
    pub url: String,

    /// Page title
    pub title: Option<String>,

    /// Text excerpt around the match
    pub snippet: Option<String>,

    /// Provider that returned the hit
    pub source: &'static str,

    /// Crawl or publish date reported by the provider
    pub date: Option<String>,
}

impl SearchHit {
    /// Creates a hit carrying only a URL
    pub fn new(url: impl Into<String>, source: &'static str) -> Self {
        Self {
            url: url.into(),
            title: None,
            snippet: None,
            source,
            date: None,
        }
    }
}

/// A web search vendor queried once per identifier
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short provider name for logs and notifications
    fn name(&self) -> &'static str;

    /// Runs an exact-phrase search for `identifier`
    ///
    /// Results come back in provider-ranked order.
    async fn search(&self, identifier: &str) -> Result<Vec<SearchHit>, ProviderError>;
}

/// Wraps an identifier for an exact-phrase query
pub fn exact_phrase(identifier: &str) -> String {
    format!("\"{}\"", identifier)
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The search configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &SearchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the provider for a run from the search configuration
///
/// With more than one provider configured, results are combined through a
/// [`MultiProvider`].
pub fn build_provider(config: &SearchConfig) -> Result<Box<dyn SearchProvider>, reqwest::Error> {
    let client = build_http_client(config)?;
    let timeout = Duration::from_secs(config.timeout_secs);

    let mut providers: Vec<Box<dyn SearchProvider>> = config
        .providers
        .iter()
        .map(|provider| -> Box<dyn SearchProvider> {
            match provider {
                ProviderConfig::Bing(bing) => Box::new(BingProvider::new(
                    client.clone(),
                    bing.clone(),
                    config.max_results,
                    timeout,
                )),
                ProviderConfig::GoogleCse(google) => Box::new(GoogleCseProvider::new(
                    client.clone(),
                    google.clone(),
                    config.max_results,
                    timeout,
                )),
            }
        })
        .collect();

    if providers.len() == 1 {
        if let Some(provider) = providers.pop() {
            return Ok(provider);
        }
    }

    Ok(Box::new(MultiProvider::new(providers)))
}

/// Maps a non-success status to a provider error
pub(crate) fn check_status(provider: &'static str, status: StatusCode) -> Result<(), ProviderError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited { provider });
    }

    if !status.is_success() {
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BingConfig;

    fn search_config(providers: Vec<ProviderConfig>) -> SearchConfig {
        SearchConfig {
            providers,
            max_results: 10,
            user_agent: "vin-watch-test/1.0".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_exact_phrase() {
        assert_eq!(exact_phrase("1HGCM82633A004352"), "\"1HGCM82633A004352\"");
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&search_config(vec![]));
        assert!(client.is_ok());
    }

    #[test]
    fn test_single_provider_is_not_wrapped() {
        let config = search_config(vec![ProviderConfig::Bing(BingConfig {
            api_key: "k".to_string(),
            endpoint: "https://bing.example.com/search".to_string(),
        })]);
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "bing");
    }

    #[test]
    fn test_check_status() {
        assert!(check_status("bing", StatusCode::OK).is_ok());
        assert!(matches!(
            check_status("bing", StatusCode::TOO_MANY_REQUESTS),
            Err(ProviderError::RateLimited { .. })
        ));
        assert!(matches!(
            check_status("bing", StatusCode::FORBIDDEN),
            Err(ProviderError::Status { status: 403, .. })
        ));
    }
}
