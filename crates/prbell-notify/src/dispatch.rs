use std::time::Duration;

use async_trait::async_trait;
use prbell_core::PrbellError;
use serde::Serialize;

use crate::envelope::MessageEnvelope;

/// Outcome of a successful webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    /// HTTP status returned by the webhook.
    pub status: u16,
    /// Response body, e.g. `ok` from Slack or `1` from Teams.
    pub body: String,
}

/// Delivers a finished payload to a chat webhook.
///
/// Exactly one call is made per run. Implementations must not retry.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// POST `envelope` to `webhook_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PrbellError::Dispatch`] on network failures and non-2xx
    /// responses.
    async fn dispatch(
        &self,
        webhook_url: &str,
        envelope: &MessageEnvelope,
    ) -> Result<DeliveryReceipt, PrbellError>;
}

/// HTTP webhook dispatcher backed by `reqwest`.
///
/// # Examples
///
/// ```
/// use prbell_notify::dispatch::WebhookDispatcher;
///
/// let dispatcher = WebhookDispatcher::new().unwrap();
/// ```
pub struct WebhookDispatcher {
    client: reqwest::Client,
}

impl WebhookDispatcher {
    /// Create a dispatcher with a 30 second request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PrbellError::Dispatch`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, PrbellError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("prbell/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PrbellError::Dispatch {
                status: None,
                message: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookDispatcher {
    async fn dispatch(
        &self,
        webhook_url: &str,
        envelope: &MessageEnvelope,
    ) -> Result<DeliveryReceipt, PrbellError> {
        tracing::debug!(webhook = %redact(webhook_url), "posting notification");

        let response = self
            .client
            .post(webhook_url)
            .json(envelope)
            .send()
            .await
            .map_err(|e| PrbellError::Dispatch {
                status: None,
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(PrbellError::Dispatch {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        Ok(DeliveryReceipt {
            status: status.as_u16(),
            body,
        })
    }
}

/// Strip the path from a webhook URL; Slack and Teams embed the secret there.
pub fn redact(webhook_url: &str) -> String {
    match reqwest::Url::parse(webhook_url) {
        Ok(url) => format!("{}://{}/…", url.scheme(), url.host_str().unwrap_or_default()),
        Err(_) => "<invalid url>".into(),
    }
}
