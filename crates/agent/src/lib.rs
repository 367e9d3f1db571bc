//! Reply pipeline for the title bot.
//!
//! One inbound text message flows through:
//! 1. **Classification** (`classifier`) - priority-ordered rules, then a yes/no model fallback
//! 2. **Dispatch** (`orchestrator`) - map the intent to a fixed reply, a generation, or a
//!    clarification
//! 3. **Generation** (`titles`) - one completion, gated on a numbered-list shape
//!
//! All model traffic goes through the [`llm::CompletionGateway`] trait; `openai` provides the
//! OpenAI-compatible HTTP implementation used in production.
//!
//! # Key Types
//!
//! - `ResponseOrchestrator` - message in, reply text out
//! - `IntentClassifier` - strategy chain of `IntentRule`s plus `ModelFallback`
//! - `TitleGenerationService` - prompt assembly and the acceptance gate

pub mod classifier;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod prompts;
pub mod titles;

#[cfg(test)]
mod testing;

pub use classifier::{Classification, DecidedBy, IntentClassifier};
pub use llm::{ChatMessage, CompletionGateway};
pub use openai::OpenAiGateway;
pub use orchestrator::{OrchestratorError, Reply, ResponseOrchestrator};
pub use titles::TitleGenerationService;
