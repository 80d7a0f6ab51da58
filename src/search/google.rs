//! Google Programmable Search (Custom Search JSON API) adapter

use crate::config::GoogleCseConfig;
use crate::search::{check_status, exact_phrase, ProviderError, SearchHit, SearchProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const NAME: &str = "google_cse";

/// The Custom Search API returns at most 10 results per call
const MAX_NUM: u32 = 10;

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Option<Vec<CseItem>>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    pagemap: Option<PageMap>,
}

#[derive(Debug, Deserialize)]
struct PageMap {
    #[serde(default)]
    metatags: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl CseItem {
    /// `article:published_time` from the first metatag block, when present
    fn published_time(&self) -> Option<String> {
        self.pagemap
            .as_ref()?
            .metatags
            .first()?
            .get("article:published_time")?
            .as_str()
            .map(str::to_string)
    }
}

/// Searches a Google Programmable Search engine
pub struct GoogleCseProvider {
    client: Client,
    config: GoogleCseConfig,
    max_results: u32,
    timeout: Duration,
}

impl GoogleCseProvider {
    pub fn new(
        client: Client,
        config: GoogleCseConfig,
        max_results: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            config,
            max_results,
            timeout,
        }
    }
}

#[async_trait]
impl SearchProvider for GoogleCseProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn search(&self, identifier: &str) -> Result<Vec<SearchHit>, ProviderError> {
        let num = self.max_results.min(MAX_NUM).to_string();
        let query = exact_phrase(identifier);

        tracing::debug!("Querying Google CSE for {}", query);

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("cx", self.config.engine_id.as_str()),
                ("q", query.as_str()),
                ("num", num.as_str()),
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
    let parsed: CseResponse = serde_json::from_str(body).map_err(|e| ProviderError::Decode {
        provider: NAME,
        message: e.to_string(),
    })?;

    Ok(parsed
        .items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| {
            let date = item.published_time();
            let url = item.link.filter(|u| !u.trim().is_empty())?;
            Some(SearchHit {
                url,
                title: item.title,
                snippet: item.snippet,
                source: NAME,
                date,
            })
        })
        .collect())
}
