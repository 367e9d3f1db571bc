use std::sync::Arc;

use reeltitle_core::{ConversationMemory, GatewayError, Intent};
use thiserror::Error;
use tracing::info;

use crate::classifier::{Classification, ClassifierError, DecidedBy, IntentClassifier};
use crate::llm::{ChatMessage, CompletionGateway, CLARIFY_TEMPERATURE};
use crate::prompts::{
    clarify_user_prompt, ABOUT_REPLY, CLARIFY_SYSTEM_PROMPT, HELP_REPLY,
    REGENERATE_WITHOUT_HISTORY_REPLY, TRANSCRIPT_REPLY,
};
use crate::titles::TitleGenerationService;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub intent: Intent,
    pub decided_by: DecidedBy,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("title generation failed for {intent}: {source}")]
    Generation {
        intent: Intent,
        #[source]
        source: GatewayError,
    },
    #[error("clarification failed: {0}")]
    Clarification(#[source] GatewayError),
}

impl OrchestratorError {
    pub fn intent(&self) -> Intent {
        match self {
            Self::Generation { intent, .. } => *intent,
            Self::Clarification(_) => Intent::Unknown,
        }
    }

    pub fn into_gateway_error(self) -> GatewayError {
        match self {
            Self::Generation { source, .. } | Self::Clarification(source) => source,
        }
    }
}

/// Turns one inbound message into one reply. Each call runs classification through to
/// reply text with no state carried between calls except the conversation memory.
pub struct ResponseOrchestrator {
    gateway: Arc<dyn CompletionGateway>,
    memory: Arc<dyn ConversationMemory>,
    classifier: IntentClassifier,
    titles: TitleGenerationService,
}

impl ResponseOrchestrator {
    pub fn new(
        gateway: Arc<dyn CompletionGateway>,
        memory: Arc<dyn ConversationMemory>,
        classifier: IntentClassifier,
        titles: TitleGenerationService,
    ) -> Self {
        Self { gateway, memory, classifier, titles }
    }

    pub fn with_default_rules(
        gateway: Arc<dyn CompletionGateway>,
        memory: Arc<dyn ConversationMemory>,
        long_message_threshold: usize,
    ) -> Result<Self, ClassifierError> {
        let classifier =
            IntentClassifier::with_default_rules(Arc::clone(&gateway), long_message_threshold)?;
        let titles = TitleGenerationService::new(Arc::clone(&gateway))
            .map_err(|source| ClassifierError::InvalidPattern { rule: "acceptance_gate", source })?;
        Ok(Self::new(gateway, memory, classifier, titles))
    }

    pub fn memory(&self) -> &Arc<dyn ConversationMemory> {
        &self.memory
    }

    pub async fn respond(&self, sender: &str, text: &str) -> Result<Reply, OrchestratorError> {
        let classification = self.classifier.classify(text).await;
        info!(
            event_name = "orchestrator.intent_classified",
            sender,
            intent = %classification.intent,
            decided_by = %classification.decided_by,
            "message classified"
        );

        let reply_text = self.dispatch(sender, text, classification).await?;
        Ok(Reply {
            intent: classification.intent,
            decided_by: classification.decided_by,
            text: reply_text,
        })
    }

    pub async fn dispatch(
        &self,
        sender: &str,
        text: &str,
        classification: Classification,
    ) -> Result<String, OrchestratorError> {
        let intent = classification.intent;
        match intent {
            Intent::Help => Ok(HELP_REPLY.to_string()),
            Intent::Transcript => Ok(TRANSCRIPT_REPLY.to_string()),
            Intent::AboutBot => Ok(ABOUT_REPLY.to_string()),
            Intent::Regenerate => {
                let Some(previous) = self.memory.last_input(sender) else {
                    info!(
                        event_name = "orchestrator.regenerate_without_history",
                        sender,
                        "no remembered content to regenerate from"
                    );
                    return Ok(REGENERATE_WITHOUT_HISTORY_REPLY.to_string());
                };
                self.titles
                    .generate(&previous, true)
                    .await
                    .map_err(|source| OrchestratorError::Generation { intent, source })
            }
            Intent::GenerateTitle => {
                self.memory.remember(sender, text);
                self.titles
                    .generate(text, false)
                    .await
                    .map_err(|source| OrchestratorError::Generation { intent, source })
            }
            Intent::Unknown => self.clarify(text).await.map_err(OrchestratorError::Clarification),
        }
    }

    async fn clarify(&self, text: &str) -> Result<String, GatewayError> {
        let messages =
            [ChatMessage::system(CLARIFY_SYSTEM_PROMPT), ChatMessage::user(clarify_user_prompt(text))];
        self.gateway.complete(&messages, CLARIFY_TEMPERATURE).await
    }
}
