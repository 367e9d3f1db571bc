use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reeltitle_core::GatewayError;

use crate::llm::{ChatMessage, CompletionGateway, Role};

#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

impl RecordedCall {
    pub fn system_prompt(&self) -> &str {
        self.messages
            .iter()
            .find(|message| message.role == Role::System)
            .map(|message| message.content.as_str())
            .unwrap_or_default()
    }

    pub fn user_prompt(&self) -> &str {
        self.messages
            .iter()
            .find(|message| message.role == Role::User)
            .map(|message| message.content.as_str())
            .unwrap_or_default()
    }
}

/// Replays queued responses in order and records every call. An exhausted script fails
/// the call, which keeps unexpected gateway use visible in assertions.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<String, GatewayError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    pub fn with_responses(responses: Vec<Result<String, GatewayError>>) -> Self {
        Self { responses: Mutex::new(responses.into()), calls: Mutex::new(Vec::new()) }
    }

    pub fn replying(text: &str) -> Self {
        Self::with_responses(vec![Ok(text.to_string())])
    }

    pub fn failing() -> Self {
        Self::with_responses(vec![Err(GatewayError::Request("connection refused".to_string()))])
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(RecordedCall { messages: messages.to_vec(), temperature });
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Request("script exhausted".to_string())))
    }
}
