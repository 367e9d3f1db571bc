use std::sync::Arc;

use reeltitle_agent::{OpenAiGateway, ResponseOrchestrator};
use reeltitle_core::config::{AppConfig, LoadOptions};
use reeltitle_core::{BoundedMemoryStore, MemoryPolicy};
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_GATEWAY_SETUP, EXIT_GENERATION};

const COMMAND: &str = "ask";

#[derive(Debug, Serialize)]
struct AskOutcome<'a> {
    command: &'static str,
    status: &'static str,
    sender: &'a str,
    intent: String,
    rule: String,
    reply: String,
}

pub fn run(sender: &str, text: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), EXIT_CONFIG)
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_GATEWAY_SETUP,
            )
        }
    };

    runtime.block_on(execute(&config, sender, text))
}

/// Runs one message through a fresh pipeline. Memory starts empty, so a regeneration
/// request here always gets the no-history reply.
pub async fn execute(config: &AppConfig, sender: &str, text: &str) -> CommandResult {
    let gateway = match OpenAiGateway::from_config(&config.llm) {
        Ok(gateway) => gateway,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "gateway_setup",
                error.to_string(),
                EXIT_GATEWAY_SETUP,
            )
        }
    };

    let memory = Arc::new(BoundedMemoryStore::new(MemoryPolicy::from(&config.memory)));
    let orchestrator = match ResponseOrchestrator::with_default_rules(
        Arc::new(gateway),
        memory,
        config.bot.long_message_threshold,
    ) {
        Ok(orchestrator) => orchestrator,
        Err(error) => {
            return CommandResult::failure(COMMAND, "classifier", error.to_string(), EXIT_CONFIG)
        }
    };

    match orchestrator.respond(sender, text).await {
        Ok(reply) => CommandResult::payload(
            0,
            &AskOutcome {
                command: COMMAND,
                status: "ok",
                sender,
                intent: reply.intent.to_string(),
                rule: reply.decided_by.to_string(),
                reply: reply.text,
            },
        ),
        Err(error) => CommandResult::failure(
            COMMAND,
            "generation",
            format!("{} ({} intent)", error, error.intent()),
            EXIT_GENERATION,
        ),
    }
}
