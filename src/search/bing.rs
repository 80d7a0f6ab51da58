//! Bing Web Search API adapter

use crate::config::BingConfig;
use crate::search::{check_status, exact_phrase, ProviderError, SearchHit, SearchProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const NAME: &str = "bing";

/// Bing caps `count` at 50 per request
const MAX_COUNT: u32 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BingResponse {
    #[serde(default)]
    web_pages: Option<WebPages>,
}

#[derive(Debug, Deserialize)]
struct WebPages {
    #[serde(default)]
    value: Vec<WebPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebPage {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    date_last_crawled: Option<String>,
}

/// Searches the Bing Web Search API
pub struct BingProvider {
    client: Client,
    config: BingConfig,
    max_results: u32,
    timeout: Duration,
}

impl BingProvider {
    pub fn new(client: Client, config: BingConfig, max_results: u32, timeout: Duration) -> Self {
        Self {
            client,
            config,
            max_results,
            timeout,
        }
    }
}

#[async_trait]
impl SearchProvider for BingProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn search(&self, identifier: &str) -> Result<Vec<SearchHit>, ProviderError> {
        let count = self.max_results.min(MAX_COUNT).to_string();
        let query = exact_phrase(identifier);

        tracing::debug!("Querying Bing for {}", query);

        let response = self
            .client
            .get(&self.config.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.config.api_key)
            .query(&[
                ("q", query.as_str()),
                ("count", count.as_str()),
                ("textDecorations", "false"),
                ("textFormat", "Raw"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(NAME, e, self.timeout))?;

        check_status(NAME, response.status())?;

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(NAME, e, self.timeout))?;
        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<Vec<SearchHit>, ProviderError> {
    let parsed: BingResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode {
            provider: NAME,
            message: e.to_string(),
        })?;

    let pages = parsed.web_pages.map(|w| w.value).unwrap_or_default();

    Ok(pages
        .into_iter()
        .filter_map(|page| {
            let url = page.url.filter(|u| !u.trim().is_empty())?;
            Some(SearchHit {
                url,
                title: page.name,
                snippet: page.snippet,
                source: NAME,
                date: page.date_last_crawled,
            })
        })
        .collect())
}
