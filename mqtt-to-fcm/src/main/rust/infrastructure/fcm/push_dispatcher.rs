use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::errors::DispatchError;
use crate::domain::ports::{NotificationSender, TokenSource};
use crate::domain::value_objects::{DispatchResult, NotificationPayload};

pub const DEFAULT_GATEWAY_URL: &str = "https://fcm.googleapis.com";

#[derive(Debug, Deserialize)]
struct SendResponse {
    name: String,
}

/// Sends notifications to the FCM HTTP v1 `messages:send` endpoint.
///
/// One POST per payload, no retries. Transport settings such as the request
/// timeout come from the shared `reqwest::Client`.
pub struct PushDispatcher {
    client: reqwest::Client,
    endpoint: String,
    tokens: Arc<dyn TokenSource>,
}

impl PushDispatcher {
    pub fn new(
        client: reqwest::Client,
        gateway_url: &str,
        project_id: &str,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        let endpoint = format!(
            "{}/v1/projects/{}/messages:send",
            gateway_url.trim_end_matches('/'),
            project_id
        );
        Self {
            client,
            endpoint,
            tokens,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn try_send(&self, payload: &NotificationPayload) -> Result<Option<String>, DispatchError> {
        let credential = self.tokens.token().await?;

        tracing::debug!(
            "Sending to {}: {}",
            self.endpoint,
            serde_json::to_string(payload).unwrap_or_default()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential.access_token())
            .json(payload)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // Delivery is decided by the status; the id is informational
        match response.json::<SendResponse>().await {
            Ok(body) => Ok(Some(body.name)),
            Err(e) => {
                tracing::warn!("Gateway accepted message but response was unreadable: {}", e);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl NotificationSender for PushDispatcher {
    async fn send(&self, payload: &NotificationPayload) -> DispatchResult {
        let result = DispatchResult::from(self.try_send(payload).await);

        match (&result.server_message_id, &result.error) {
            (_, Some(e)) => tracing::error!(
                topic = %payload.target_topic(),
                "Unable to send message to push gateway: {}",
                e
            ),
            (Some(id), None) => tracing::info!("Message sent to push gateway, response: {}", id),
            (None, None) => tracing::info!("Message sent to push gateway"),
        }

        result
    }
}
