use crate::notify::{AlertSummary, Notifier, NotifyError};
use async_trait::async_trait;

/// Delivers to every channel; succeeds if at least one channel delivered
pub struct MultiNotifier {
    channels: Vec<Box<dyn Notifier>>,
}

impl MultiNotifier {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl Notifier for MultiNotifier {
    fn name(&self) -> &'static str {
        "multi"
    }

    async fn notify(&self, summary: &AlertSummary) -> Result<(), NotifyError> {
        let mut delivered = 0;
        let mut failures = Vec::new();

        for channel in &self.channels {
            match channel.notify(summary).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!("{} notification failed: {}", channel.name(), e);
                    failures.push(format!("{}: {}", channel.name(), e));
                }
            }
        }

        if delivered == 0 && !failures.is_empty() {
            return Err(NotifyError::AllChannelsFailed(failures.join("; ")));
        }

        Ok(())
    }
}
