use std::time::Duration;

use async_trait::async_trait;
use reeltitle_core::config::LineConfig;
use reeltitle_core::DeliveryError;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

pub const REPLY_PATH: &str = "/v2/bot/message/reply";
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends one text reply bound to a platform reply token. Single attempt, no retry.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send(&self, reply_token: &str, text: &str) -> Result<(), DeliveryError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    message_type: &'static str,
    text: &'a str,
}

pub struct LineReplyClient {
    client: reqwest::Client,
    endpoint: String,
    channel_access_token: SecretString,
}

impl LineReplyClient {
    pub fn new(
        api_base_url: &str,
        channel_access_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| DeliveryError::Request(error.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}{REPLY_PATH}", api_base_url.trim_end_matches('/')),
            channel_access_token,
        })
    }

    pub fn from_config(config: &LineConfig) -> Result<Self, DeliveryError> {
        Self::new(&config.api_base_url, config.channel_access_token.clone(), DEFAULT_REPLY_TIMEOUT)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReplySender for LineReplyClient {
    async fn send(&self, reply_token: &str, text: &str) -> Result<(), DeliveryError> {
        let body = ReplyRequest {
            reply_token,
            messages: [TextMessage { message_type: "text", text }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.channel_access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|error| DeliveryError::Request(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected { status: status.as_u16(), body });
        }

        debug!(
            event_name = "delivery.line.reply_sent",
            status = status.as_u16(),
            text_chars = text.chars().count(),
            "reply accepted by LINE"
        );
        Ok(())
    }
}
