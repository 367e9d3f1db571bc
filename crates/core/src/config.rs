use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::memory::{DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_SENDERS, DEFAULT_TTL};

pub const DEFAULT_LINE_API_BASE_URL: &str = "https://api.line.me";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LONG_MESSAGE_THRESHOLD: usize = 50;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub line: LineConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub memory: MemoryConfig,
    pub bot: BotConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LineConfig {
    pub channel_access_token: SecretString,
    pub api_base_url: String,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct MemoryConfig {
    pub history_capacity: usize,
    /// Zero disables expiry.
    pub ttl_secs: u64,
    pub max_senders: usize,
}

#[derive(Clone, Debug)]
pub struct BotConfig {
    /// Messages longer than this many characters skip the model fallback and are treated
    /// as title-generation content.
    pub long_message_threshold: usize,
    /// When a title generation or clarification call fails, reply with a fixed apology
    /// instead of staying silent.
    pub reply_on_generation_failure: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub line_channel_access_token: Option<String>,
    pub line_api_base_url: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub server_port: Option<u16>,
    pub reply_on_generation_failure: Option<bool>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            line: LineConfig {
                channel_access_token: String::new().into(),
                api_base_url: DEFAULT_LINE_API_BASE_URL.to_string(),
            },
            llm: LlmConfig {
                provider: LlmProvider::OpenAi,
                api_key: None,
                base_url: None,
                model: "gpt-4o".to_string(),
                timeout_secs: 60,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 3000,
                graceful_shutdown_secs: 15,
            },
            memory: MemoryConfig {
                history_capacity: DEFAULT_HISTORY_CAPACITY,
                ttl_secs: DEFAULT_TTL.as_secs(),
                max_senders: DEFAULT_MAX_SENDERS,
            },
            bot: BotConfig {
                long_message_threshold: DEFAULT_LONG_MESSAGE_THRESHOLD,
                reply_on_generation_failure: true,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl LlmConfig {
    /// Base URL of the OpenAI-compatible API, without a trailing slash.
    pub fn resolved_base_url(&self) -> String {
        let base = match (&self.base_url, self.provider) {
            (Some(base_url), _) => base_url.as_str(),
            (None, LlmProvider::OpenAi) => DEFAULT_OPENAI_BASE_URL,
            (None, LlmProvider::Ollama) => "http://localhost:11434/v1",
        };
        base.trim_end_matches('/').to_string()
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("reeltitle.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(line) = patch.line {
            if let Some(channel_access_token) = line.channel_access_token {
                self.line.channel_access_token = secret_value(channel_access_token);
            }
            if let Some(api_base_url) = line.api_base_url {
                self.line.api_base_url = api_base_url;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(memory) = patch.memory {
            if let Some(history_capacity) = memory.history_capacity {
                self.memory.history_capacity = history_capacity;
            }
            if let Some(ttl_secs) = memory.ttl_secs {
                self.memory.ttl_secs = ttl_secs;
            }
            if let Some(max_senders) = memory.max_senders {
                self.memory.max_senders = max_senders;
            }
        }

        if let Some(bot) = patch.bot {
            if let Some(long_message_threshold) = bot.long_message_threshold {
                self.bot.long_message_threshold = long_message_threshold;
            }
            if let Some(reply_on_generation_failure) = bot.reply_on_generation_failure {
                self.bot.reply_on_generation_failure = reply_on_generation_failure;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let channel_token = read_env("REELTITLE_LINE_CHANNEL_ACCESS_TOKEN")
            .or_else(|| read_env("LINE_CHANNEL_ACCESS_TOKEN"));
        if let Some(value) = channel_token {
            self.line.channel_access_token = secret_value(value);
        }
        if let Some(value) = read_env("REELTITLE_LINE_API_BASE_URL") {
            self.line.api_base_url = value;
        }

        if let Some(value) = read_env("REELTITLE_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        let api_key = read_env("REELTITLE_LLM_API_KEY").or_else(|| read_env("OPENAI_API_KEY"));
        if let Some(value) = api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("REELTITLE_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("REELTITLE_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("REELTITLE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("REELTITLE_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("REELTITLE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("REELTITLE_SERVER_PORT") {
            self.server.port = parse_u16("REELTITLE_SERVER_PORT", &value)?;
        } else if let Some(value) = read_env("PORT") {
            self.server.port = parse_u16("PORT", &value)?;
        }
        if let Some(value) = read_env("REELTITLE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("REELTITLE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("REELTITLE_MEMORY_HISTORY_CAPACITY") {
            self.memory.history_capacity =
                parse_usize("REELTITLE_MEMORY_HISTORY_CAPACITY", &value)?;
        }
        if let Some(value) = read_env("REELTITLE_MEMORY_TTL_SECS") {
            self.memory.ttl_secs = parse_u64("REELTITLE_MEMORY_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("REELTITLE_MEMORY_MAX_SENDERS") {
            self.memory.max_senders = parse_usize("REELTITLE_MEMORY_MAX_SENDERS", &value)?;
        }

        if let Some(value) = read_env("REELTITLE_BOT_LONG_MESSAGE_THRESHOLD") {
            self.bot.long_message_threshold =
                parse_usize("REELTITLE_BOT_LONG_MESSAGE_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("REELTITLE_BOT_REPLY_ON_GENERATION_FAILURE") {
            self.bot.reply_on_generation_failure =
                parse_bool("REELTITLE_BOT_REPLY_ON_GENERATION_FAILURE", &value)?;
        }

        let log_level =
            read_env("REELTITLE_LOGGING_LEVEL").or_else(|| read_env("REELTITLE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("REELTITLE_LOGGING_FORMAT").or_else(|| read_env("REELTITLE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(channel_access_token) = overrides.line_channel_access_token {
            self.line.channel_access_token = secret_value(channel_access_token);
        }
        if let Some(api_base_url) = overrides.line_api_base_url {
            self.line.api_base_url = api_base_url;
        }
        if let Some(provider) = overrides.llm_provider {
            self.llm.provider = provider;
        }
        if let Some(api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(api_key));
        }
        if let Some(base_url) = overrides.llm_base_url {
            self.llm.base_url = Some(base_url);
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(reply_on_generation_failure) = overrides.reply_on_generation_failure {
            self.bot.reply_on_generation_failure = reply_on_generation_failure;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_line(&self.line)?;
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_memory(&self.memory)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("reeltitle.toml"), PathBuf::from("config/reeltitle.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_line(line: &LineConfig) -> Result<(), ConfigError> {
    if line.channel_access_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "line.channel_access_token is required. Issue one at https://developers.line.biz/console/ > Your Channel > Messaging API > Channel access token".to_string(),
        ));
    }

    let base_url = line.api_base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "line.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    match llm.provider {
        LlmProvider::OpenAi => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for the openai provider (or set OPENAI_API_KEY)"
                        .to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let missing =
                llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for the ollama provider".to_string(),
                ));
            }
        }
    }

    if let Some(base_url) = &llm.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "llm.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_memory(memory: &MemoryConfig) -> Result<(), ConfigError> {
    if memory.history_capacity == 0 {
        return Err(ConfigError::Validation(
            "memory.history_capacity must be greater than zero".to_string(),
        ));
    }

    if memory.max_senders == 0 {
        return Err(ConfigError::Validation(
            "memory.max_senders must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    line: Option<LinePatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    memory: Option<MemoryPatch>,
    bot: Option<BotPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LinePatch {
    channel_access_token: Option<String>,
    api_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MemoryPatch {
    history_capacity: Option<usize>,
    ttl_secs: Option<u64>,
    max_senders: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct BotPatch {
    long_message_threshold: Option<usize>,
    reply_on_generation_failure: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
