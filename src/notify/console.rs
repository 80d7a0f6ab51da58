use crate::notify::{render_body, render_subject, AlertSummary, Notifier, NotifyError};
use async_trait::async_trait;

/// Prints alerts to stdout; used when no other channel is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn notify(&self, summary: &AlertSummary) -> Result<(), NotifyError> {
        println!("{}\n", render_subject(summary));
        print!("{}", render_body(summary));
        Ok(())
    }
}
