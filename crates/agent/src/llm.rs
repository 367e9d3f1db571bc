use async_trait::async_trait;
use reeltitle_core::GatewayError;
use serde::{Deserialize, Serialize};

pub const TITLE_TEMPERATURE: f32 = 0.7;
pub const CLASSIFY_TEMPERATURE: f32 = 0.0;
pub const CLARIFY_TEMPERATURE: f32 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Black-box text completion. One call, one attempt; latency bounds are the
/// implementation's concern.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, GatewayError>;
}
