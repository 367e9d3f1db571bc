use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use reeltitle_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct Field {
    key: &'static str,
    value: String,
    /// Environment variables that feed this field, highest precedence first.
    env_keys: &'static [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let llm_api_key = match &config.llm.api_key {
        Some(key) => redact_secret(key.expose_secret()),
        None => "<unset>".to_string(),
    };

    vec![
        Field {
            key: "line.channel_access_token",
            value: redact_secret(config.line.channel_access_token.expose_secret()),
            env_keys: &["REELTITLE_LINE_CHANNEL_ACCESS_TOKEN", "LINE_CHANNEL_ACCESS_TOKEN"],
        },
        Field {
            key: "line.api_base_url",
            value: config.line.api_base_url.clone(),
            env_keys: &["REELTITLE_LINE_API_BASE_URL"],
        },
        Field {
            key: "llm.provider",
            value: config.llm.provider.to_string(),
            env_keys: &["REELTITLE_LLM_PROVIDER"],
        },
        Field {
            key: "llm.model",
            value: config.llm.model.clone(),
            env_keys: &["REELTITLE_LLM_MODEL"],
        },
        Field {
            key: "llm.base_url",
            value: config.llm.resolved_base_url(),
            env_keys: &["REELTITLE_LLM_BASE_URL"],
        },
        Field {
            key: "llm.api_key",
            value: llm_api_key,
            env_keys: &["REELTITLE_LLM_API_KEY", "OPENAI_API_KEY"],
        },
        Field {
            key: "llm.timeout_secs",
            value: config.llm.timeout_secs.to_string(),
            env_keys: &["REELTITLE_LLM_TIMEOUT_SECS"],
        },
        Field {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["REELTITLE_SERVER_BIND_ADDRESS"],
        },
        Field {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["REELTITLE_SERVER_PORT", "PORT"],
        },
        Field {
            key: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["REELTITLE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key: "memory.history_capacity",
            value: config.memory.history_capacity.to_string(),
            env_keys: &["REELTITLE_MEMORY_HISTORY_CAPACITY"],
        },
        Field {
            key: "memory.ttl_secs",
            value: config.memory.ttl_secs.to_string(),
            env_keys: &["REELTITLE_MEMORY_TTL_SECS"],
        },
        Field {
            key: "memory.max_senders",
            value: config.memory.max_senders.to_string(),
            env_keys: &["REELTITLE_MEMORY_MAX_SENDERS"],
        },
        Field {
            key: "bot.long_message_threshold",
            value: config.bot.long_message_threshold.to_string(),
            env_keys: &["REELTITLE_BOT_LONG_MESSAGE_THRESHOLD"],
        },
        Field {
            key: "bot.reply_on_generation_failure",
            value: config.bot.reply_on_generation_failure.to_string(),
            env_keys: &["REELTITLE_BOT_REPLY_ON_GENERATION_FAILURE"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["REELTITLE_LOGGING_LEVEL", "REELTITLE_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format).to_lowercase(),
            env_keys: &["REELTITLE_LOGGING_FORMAT", "REELTITLE_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("reeltitle.toml"), PathBuf::from("config/reeltitle.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env_is_set(key)) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn env_is_set(key: &str) -> bool {
    env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false)
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a short prefix so operators can tell credentials apart without exposing them.
fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        if prefix.len() <= 8 {
            return format!("{prefix}-***");
        }
    }

    "<redacted>".to_string()
}
