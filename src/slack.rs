// Third Party
use async_trait::async_trait;
use tracing::{debug, info};

// Local
use crate::{
    error::{Result, StreamerError},
    formatter::SlackMessage,
};

/// Anything that can take a formatted message to the chat channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `message` once. Failures are returned to the caller, never retried here.
    async fn deliver(&self, message: &SlackMessage) -> Result<()>;
}

/// Posts messages to a Slack incoming web hook,
/// e.g. `https://hooks.slack.com/services/XXXXXXX/XXXXXXX/XXXXXXXXXXXX`.
pub struct SlackWebhook {
    client: reqwest::Client,
    url: String,
}

impl SlackWebhook {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for SlackWebhook {
    async fn deliver(&self, message: &SlackMessage) -> Result<()> {
        info!("Posting the following message:\n{:?}", message);
        let response = self.client.post(&self.url).json(message).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StreamerError::DeliveryRejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!("Web hook responded {}: {}", status, body);
        Ok(())
    }
}
