use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::value::{Uncased, UncasedStr};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::{Config, StoreBackend};
use crate::infrastructure::logging::LogConfig;
use crate::services::filters::FilterEngine;

/// Configuration file read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "deskfy-relay.yaml";

/// Prefix of relay-specific environment variables
pub const ENV_PREFIX: &str = "DESKFY_RELAY_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Invalid port: 0")]
    InvalidPort,

    #[error("Invalid webhook path: {0:?}. Must start with '/'")]
    InvalidWebhookPath(String),

    #[error("Invalid {0}: must be greater than zero")]
    ZeroValue(&'static str),

    #[error("Store namespace cannot be empty")]
    EmptyNamespace,

    #[error("Slack {0} is configured but slack.bot_token is missing")]
    MissingBotToken(&'static str),

    #[error("Store backend 'rest' requires store.{0}")]
    MissingStoreSetting(&'static str),

    #[error("Invalid filter rule: {0}")]
    InvalidRule(String),
}

/// Conventional deployment variables and the settings they map to.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("SLACK_BOT_TOKEN", "slack.bot_token"),
    ("SLACK_CHANNEL_ORG_CARDAPIOS", "slack.log_channel"),
    ("SLACK_CHANNEL_LISTA", "slack.card_channel"),
    ("KV_REST_API_URL", "store.rest_url"),
    ("KV_REST_API_TOKEN", "store.rest_token"),
    ("PORT", "server.port"),
];

fn legacy_env_key(key: &UncasedStr) -> Option<Uncased<'_>> {
    LEGACY_ENV
        .iter()
        .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
        .map(|(_, setting)| Uncased::from(*setting))
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `path`, or deskfy-relay.yaml in the working directory (optional)
    /// 3. Environment variables (DESKFY_RELAY_* prefix, `__` nests)
    /// 4. Conventional deployment variables (SLACK_BOT_TOKEN, KV_REST_API_URL, ...)
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        if path.is_some() && !file.exists() {
            anyhow::bail!("Config file not found: {}", file.display());
        }

        let config: Config = Self::figment(file)
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// The figment behind [`ConfigLoader::load`]
    pub fn figment(file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Env::raw().filter_map(legacy_env_key))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        // Logging
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        LogConfig::try_from(&config.logging)?;

        // Server
        if config.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if !config.server.webhook_path.starts_with('/') {
            return Err(ConfigError::InvalidWebhookPath(
                config.server.webhook_path.clone(),
            ));
        }
        if config.server.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroValue("server.request_timeout_secs"));
        }

        // Slack
        if config.slack.timeout_secs == 0 {
            return Err(ConfigError::ZeroValue("slack.timeout_secs"));
        }
        if config.slack.max_requests_per_second == 0 {
            return Err(ConfigError::ZeroValue("slack.max_requests_per_second"));
        }
        let has_token = config
            .slack
            .bot_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if config.slack.log_channel.is_some() && !has_token {
            return Err(ConfigError::MissingBotToken("log_channel"));
        }
        if config.slack.card_channel.is_some() && !has_token {
            return Err(ConfigError::MissingBotToken("card_channel"));
        }

        // Store
        if config.store.namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if config.store.timeout_secs == 0 {
            return Err(ConfigError::ZeroValue("store.timeout_secs"));
        }
        if config.store_required() && config.store.backend == StoreBackend::Rest {
            let missing = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
            if missing(&config.store.rest_url) {
                return Err(ConfigError::MissingStoreSetting("rest_url"));
            }
            if missing(&config.store.rest_token) {
                return Err(ConfigError::MissingStoreSetting("rest_token"));
            }
        }

        // Filters
        FilterEngine::new(&config.filters).map_err(|e| ConfigError::InvalidRule(e.to_string()))?;

        Ok(())
    }
}
