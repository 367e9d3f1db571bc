use std::sync::Arc;

use async_trait::async_trait;
use reeltitle_agent::ResponseOrchestrator;
use reeltitle_core::{ApplicationError, InterfaceError};
use reeltitle_line::{EventContext, InboundTextMessage, TextMessageService};
use tracing::info;

/// Bridges LINE text messages into the reply pipeline.
pub struct TitleBotService {
    orchestrator: Arc<ResponseOrchestrator>,
}

impl TitleBotService {
    pub fn new(orchestrator: Arc<ResponseOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl TextMessageService for TitleBotService {
    async fn handle_text_message(
        &self,
        message: &InboundTextMessage,
        ctx: &EventContext,
    ) -> Result<String, InterfaceError> {
        let reply = self
            .orchestrator
            .respond(&message.sender, &message.text)
            .await
            .map_err(|error| {
                ApplicationError::from(error.into_gateway_error())
                    .into_interface(ctx.correlation_id.clone())
            })?;

        info!(
            event_name = "bot.reply_ready",
            correlation_id = %ctx.correlation_id,
            sender = %message.sender,
            intent = %reply.intent,
            rule = %reply.decided_by,
            "reply produced"
        );
        Ok(reply.text)
    }
}
