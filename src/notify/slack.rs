//! Slack-compatible incoming webhook channel

use crate::notify::{render_body, AlertSummary, Notifier, NotifyError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const NAME: &str = "slack";

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Posts the alert body to a webhook as `{"text": ...}`
pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn new(webhook_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn notify(&self, summary: &AlertSummary) -> Result<(), NotifyError> {
        let body = render_body(summary);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&WebhookPayload { text: &body })
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    NotifyError::Timeout(self.timeout)
                } else {
                    NotifyError::Http {
                        channel: NAME,
                        source,
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                channel: NAME,
                status: status.as_u16(),
            });
        }

        tracing::info!("Posted {} new matches to webhook", summary.match_count());
        Ok(())
    }
}
