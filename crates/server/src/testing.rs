use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reeltitle_agent::{ChatMessage, CompletionGateway};
use reeltitle_core::{DeliveryError, GatewayError};
use reeltitle_line::ReplySender;

#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<String, GatewayError>>>,
}

impl ScriptedGateway {
    pub fn with_responses(responses: Vec<Result<String, GatewayError>>) -> Self {
        Self { responses: Mutex::new(responses.into()) }
    }

    pub fn failing() -> Self {
        Self::with_responses(vec![Err(GatewayError::Request("connection refused".to_owned()))])
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _temperature: f32,
    ) -> Result<String, GatewayError> {
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Request("script exhausted".to_owned())))
    }
}

#[derive(Default)]
pub struct RecordingReplySender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingReplySender {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("sent lock").clone()
    }
}

#[async_trait]
impl ReplySender for RecordingReplySender {
    async fn send(&self, reply_token: &str, text: &str) -> Result<(), DeliveryError> {
        self.sent.lock().expect("sent lock").push((reply_token.to_owned(), text.to_owned()));
        Ok(())
    }
}
