//! OpenAI-compatible `chat/completions` gateway.
//!
//! Works against OpenAI itself and any server exposing the same surface (Ollama's `/v1`).
//! The request timeout configured here is the only latency bound in the pipeline.

use std::time::Duration;

use async_trait::async_trait;
use reeltitle_core::config::LlmConfig;
use reeltitle_core::GatewayError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::{ChatMessage, CompletionGateway};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
}

impl OpenAiGateway {
    pub fn new(
        base_url: &str,
        api_key: Option<SecretString>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| GatewayError::Request(error.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model: model.into(),
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, GatewayError> {
        Self::new(
            &config.resolved_base_url(),
            config.api_key.clone(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionGateway for OpenAiGateway {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, GatewayError> {
        let body = ChatRequest { model: &self.model, messages, temperature };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response =
            request.send().await.map_err(|error| GatewayError::Request(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status: status.as_u16(), body });
        }

        let parsed: ChatResponse =
            response.json().await.map_err(|error| GatewayError::Decode(error.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GatewayError::EmptyCompletion)?;

        debug!(
            event_name = "gateway.completion.received",
            model = %self.model,
            temperature,
            chars = content.chars().count(),
            "completion received"
        );
        Ok(content)
    }
}
