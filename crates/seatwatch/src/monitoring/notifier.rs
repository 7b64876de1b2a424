use std::time::Duration;

use tracing::{error, info, warn};

use super::alert::RenderedAlert;

/// Outbound delivery channel for rendered alerts.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, alert: &RenderedAlert) -> Result<(), DeliveryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notification endpoint returned status {0}")]
    Status(u16),
    #[error("notification delivery timed out after {0:?}")]
    Timeout(Duration),
    #[error("notification topic is not configured")]
    MissingTopic,
}

/// Publishes alerts to an ntfy server as `POST {base_url}/{topic}`.
#[derive(Debug, Clone)]
pub struct NtfyNotifier {
    base_url: String,
    client: reqwest::Client,
}

impl NtfyNotifier {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn topic_url(&self, topic: &str) -> String {
        format!("{}/{}", self.base_url, topic)
    }
}

#[async_trait::async_trait]
impl Notifier for NtfyNotifier {
    async fn deliver(&self, alert: &RenderedAlert) -> Result<(), DeliveryError> {
        let topic = alert.topic.trim();
        if topic.is_empty() {
            return Err(DeliveryError::MissingTopic);
        }

        let response = self
            .client
            .post(self.topic_url(topic))
            .header("Title", alert.headline.as_str())
            .header("Priority", "high")
            .header("Tags", "tada")
            .body(alert.body().into_bytes())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Outcome counts for one batch handed to [`dispatch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Deliver alerts one at a time, each bounded by `timeout`.
///
/// Failures are logged and never retried; alerts without a topic are skipped.
pub(crate) async fn dispatch<N>(
    notifier: &N,
    alerts: Vec<RenderedAlert>,
    timeout: Duration,
) -> DispatchSummary
where
    N: Notifier + ?Sized,
{
    let mut summary = DispatchSummary::default();

    for alert in alerts {
        if alert.topic.trim().is_empty() {
            warn!(
                class_number = %alert.class_number,
                kind = alert.kind.label(),
                "ntfy topic is not set; skipping notification"
            );
            summary.skipped += 1;
            continue;
        }

        let outcome = match tokio::time::timeout(timeout, notifier.deliver(&alert)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(timeout)),
        };

        match outcome {
            Ok(()) => {
                info!(
                    class_number = %alert.class_number,
                    kind = alert.kind.label(),
                    topic = %alert.topic,
                    "sent notification"
                );
                summary.delivered += 1;
            }
            Err(err) => {
                error!(
                    class_number = %alert.class_number,
                    kind = alert.kind.label(),
                    error = %err,
                    "failed to deliver notification"
                );
                summary.failed += 1;
            }
        }
    }

    summary
}
