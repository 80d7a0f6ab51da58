//! SMTP email channel

use crate::config::EmailConfig;
use crate::notify::{render_body, render_subject, AlertSummary, Notifier, NotifyError};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

/// Sends the alert as a plain-text email over STARTTLS with login credentials
pub struct EmailNotifier {
    config: EmailConfig,
    timeout: Duration,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    /// Builds the message without sending it
    pub fn build_message(&self, summary: &AlertSummary) -> Result<Message, NotifyError> {
        let from: Mailbox = self.config.from.parse()?;
        let to: Mailbox = self.config.to.parse()?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(render_subject(summary))
            .header(ContentType::TEXT_PLAIN)
            .body(render_body(summary))?;

        Ok(message)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn notify(&self, summary: &AlertSummary) -> Result<(), NotifyError> {
        let message = self.build_message(summary)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_server)?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.smtp_user.clone(),
                self.config.smtp_pass.clone(),
            ))
            .timeout(Some(self.timeout))
            .build();

        mailer.send(message).await?;

        tracing::info!(
            "Emailed {} new matches to {}",
            summary.match_count(),
            self.config.to
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::AlertMatch;

    fn config() -> EmailConfig {
        EmailConfig {
            to: "me@example.com".to_string(),
            from: "alerts@example.com".to_string(),
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_user: "alerts".to_string(),
            smtp_pass: "secret".to_string(),
        }
    }

    fn summary() -> AlertSummary {
        let mut summary = AlertSummary::new();
        summary.push("1HGCM82633A004352", vec![AlertMatch::bare("http://a.com/x")]);
        summary
    }

    #[test]
    fn test_build_message_headers() {
        let notifier = EmailNotifier::new(config(), Duration::from_secs(5));
        let message = notifier.build_message(&summary()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: VIN NEW MATCH: 1HGCM82633A004352"));
        assert!(raw.contains("To: me@example.com"));
        assert!(raw.contains("From: alerts@example.com"));
        assert!(raw.contains("http://a.com/x"));
    }

    #[test]
    fn test_bad_address_is_an_error() {
        let mut config = config();
        config.to = "not an address".to_string();
        let notifier = EmailNotifier::new(config, Duration::from_secs(5));
        assert!(matches!(
            notifier.build_message(&summary()),
            Err(NotifyError::Address(_))
        ));
    }
}
