//! LINE webhook payload model.
//!
//! Parsing is tolerant: a body that is not JSON or has no `events` array is a
//! [`PayloadError`] the caller logs and acknowledges anyway, and individual events that fail
//! to decode or are not text messages are skipped and counted.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("webhook body is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("webhook body has no `events` array")]
    MissingEvents,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl EventContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self { correlation_id: correlation_id.into() }
    }

    /// Fresh v4 id for one webhook delivery.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundTextMessage {
    pub sender: String,
    pub text: String,
    pub reply_token: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedDelivery {
    pub messages: Vec<InboundTextMessage>,
    pub skipped: usize,
}

impl ParsedDelivery {
    pub fn event_count(&self) -> usize {
        self.messages.len() + self.skipped
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    reply_token: Option<String>,
    #[serde(default)]
    source: Option<EventSource>,
    #[serde(default)]
    message: Option<RawMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventSource {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    group_id: Option<String>,
    #[serde(default)]
    room_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    text: Option<String>,
}

pub fn parse_delivery(body: &[u8]) -> Result<ParsedDelivery, PayloadError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|error| PayloadError::InvalidJson(error.to_string()))?;
    let Some(Value::Array(events)) = payload.get("events") else {
        return Err(PayloadError::MissingEvents);
    };

    let mut delivery = ParsedDelivery::default();
    for (index, event) in events.iter().enumerate() {
        match serde_json::from_value::<RawEvent>(event.clone()) {
            Ok(raw) => match into_text_message(raw) {
                Some(message) => delivery.messages.push(message),
                None => delivery.skipped += 1,
            },
            Err(error) => {
                debug!(
                    event_name = "ingress.line.event_undecodable",
                    index,
                    error = %error,
                    "skipping event that failed to decode"
                );
                delivery.skipped += 1;
            }
        }
    }
    Ok(delivery)
}

fn into_text_message(raw: RawEvent) -> Option<InboundTextMessage> {
    if raw.event_type != "message" {
        debug!(
            event_name = "ingress.line.event_ignored",
            event_type = %raw.event_type,
            "ignoring non-message event"
        );
        return None;
    }

    let message = raw.message?;
    if message.message_type != "text" {
        debug!(
            event_name = "ingress.line.event_ignored",
            message_type = %message.message_type,
            "ignoring non-text message"
        );
        return None;
    }

    let text = message.text?;
    let reply_token = raw.reply_token.filter(|token| !token.is_empty())?;
    let source = raw.source.unwrap_or_default();
    let sender = source
        .user_id
        .or(source.group_id)
        .or(source.room_id)
        .unwrap_or_else(|| reply_token.clone());

    Some(InboundTextMessage { sender, text, reply_token })
}
