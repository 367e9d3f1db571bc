use std::sync::Arc;

use reeltitle_agent::classifier::ClassifierError;
use reeltitle_agent::{CompletionGateway, OpenAiGateway, ResponseOrchestrator};
use reeltitle_core::config::{AppConfig, ConfigError};
use reeltitle_core::{BoundedMemoryStore, DeliveryError, GatewayError, MemoryPolicy};
use reeltitle_line::{LineReplyClient, ReplySender, WebhookProcessor};
use thiserror::Error;
use tracing::info;

use crate::bot::TitleBotService;

pub struct Application {
    pub config: AppConfig,
    pub memory: Arc<BoundedMemoryStore>,
    pub processor: Arc<WebhookProcessor>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("completion gateway setup failed: {0}")]
    Gateway(#[source] GatewayError),
    #[error("LINE reply client setup failed: {0}")]
    Delivery(#[source] DeliveryError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let gateway = OpenAiGateway::from_config(&config.llm).map_err(BootstrapError::Gateway)?;
    info!(
        event_name = "system.bootstrap.gateway_ready",
        correlation_id = "bootstrap",
        provider = %config.llm.provider,
        model = gateway.model(),
        endpoint = gateway.endpoint(),
        "completion gateway configured"
    );

    let replies = LineReplyClient::from_config(&config.line).map_err(BootstrapError::Delivery)?;
    assemble(config, Arc::new(gateway), Arc::new(replies))
}

/// Wires the pipeline around an already-built gateway and reply sender.
pub fn assemble(
    config: AppConfig,
    gateway: Arc<dyn CompletionGateway>,
    replies: Arc<dyn ReplySender>,
) -> Result<Application, BootstrapError> {
    let memory = Arc::new(BoundedMemoryStore::new(MemoryPolicy::from(&config.memory)));
    let orchestrator = ResponseOrchestrator::with_default_rules(
        gateway,
        memory.clone(),
        config.bot.long_message_threshold,
    )?;
    let service = TitleBotService::new(Arc::new(orchestrator));
    let processor = WebhookProcessor::new(
        Arc::new(service),
        replies,
        config.bot.reply_on_generation_failure,
    );

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        history_capacity = config.memory.history_capacity,
        max_senders = config.memory.max_senders,
        reply_on_generation_failure = config.bot.reply_on_generation_failure,
        "reply pipeline assembled"
    );

    Ok(Application { config, memory, processor: Arc::new(processor) })
}

#[cfg(test)]
mod tests {
    use reeltitle_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use reeltitle_core::ConversationMemory;

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?)
    }

    #[test]
    fn bootstrap_fails_fast_without_channel_access_token() {
        let result = bootstrap(LoadOptions {
            config_path: Some("does-not-exist/reeltitle.toml".into()),
            overrides: ConfigOverrides {
                line_channel_access_token: Some("   ".to_owned()),
                llm_api_key: Some("sk-test".to_owned()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let message = result.err().expect("bootstrap should fail").to_string();
        assert!(message.contains("line.channel_access_token"), "{message}");
    }

    #[test]
    fn bootstrap_succeeds_with_valid_overrides() {
        let app = bootstrap(LoadOptions {
            config_path: Some("does-not-exist/reeltitle.toml".into()),
            overrides: ConfigOverrides {
                line_channel_access_token: Some("line-token".to_owned()),
                llm_api_key: Some("sk-test".to_owned()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("bootstrap should succeed");

        assert_eq!(app.memory.policy().history_capacity, app.config.memory.history_capacity);
        assert_eq!(app.memory.tracked_senders(), 0);
    }
}
