use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cnp_core::{PostPayload, PublishError, PublishReceipt, Publisher};
use tracing::info;

/// Logs posts instead of sending them.
#[derive(Debug, Default)]
pub struct DryRunPublisher {
    sent: AtomicUsize,
}

impl DryRunPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for DryRunPublisher {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn publish(&self, payload: &PostPayload) -> Result<PublishReceipt, PublishError> {
        let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "🐦 [dry-run] Would post ({} chars, image: {:?}):\n{}",
            payload.text().chars().count(),
            payload.image_path(),
            payload.text()
        );
        Ok(PublishReceipt {
            post_id: format!("dry-run-{}", n),
        })
    }
}
