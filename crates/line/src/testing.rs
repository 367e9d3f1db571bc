use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reeltitle_core::{DeliveryError, InterfaceError};

use crate::events::{EventContext, InboundTextMessage};
use crate::processor::TextMessageService;
use crate::reply::ReplySender;

/// Echoes each message back, or replays queued results when scripted.
#[derive(Default)]
pub struct ScriptedTextService {
    results: Mutex<VecDeque<Result<String, InterfaceError>>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedTextService {
    pub fn echo() -> Self {
        Self::default()
    }

    pub fn with_results(results: Vec<Result<String, InterfaceError>>) -> Self {
        Self { results: Mutex::new(results.into()), seen: Mutex::new(Vec::new()) }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().expect("seen lock").clone()
    }
}

#[async_trait]
impl TextMessageService for ScriptedTextService {
    async fn handle_text_message(
        &self,
        message: &InboundTextMessage,
        _ctx: &EventContext,
    ) -> Result<String, InterfaceError> {
        self.seen.lock().expect("seen lock").push(message.text.clone());
        self.results
            .lock()
            .expect("results lock")
            .pop_front()
            .unwrap_or_else(|| Ok(format!("echo: {}", message.text)))
    }
}

#[derive(Default)]
pub struct RecordingReplySender {
    sent: Mutex<Vec<(String, String)>>,
    fail_first: Mutex<Option<DeliveryError>>,
}

impl RecordingReplySender {
    pub fn failing_first(error: DeliveryError) -> Self {
        Self { sent: Mutex::new(Vec::new()), fail_first: Mutex::new(Some(error)) }
    }

    /// Successful sends only.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("sent lock").clone()
    }
}

#[async_trait]
impl ReplySender for RecordingReplySender {
    async fn send(&self, reply_token: &str, text: &str) -> Result<(), DeliveryError> {
        if let Some(error) = self.fail_first.lock().expect("fail lock").take() {
            return Err(error);
        }
        self.sent.lock().expect("sent lock").push((reply_token.to_owned(), text.to_owned()));
        Ok(())
    }
}
