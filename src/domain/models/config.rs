use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::filter::{GeoTarget, MatchRule};

/// Placeholder shown in place of secrets.
pub const REDACTED: &str = "[REDACTED]";

/// Main configuration structure for the relay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Slack configuration
    #[serde(default)]
    pub slack: SlackConfig,

    /// Correlation store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Block-lists and filtering policy
    #[serde(default)]
    pub filters: FilterConfig,

    /// Status code to display label overrides, merged over the built-in table
    #[serde(default)]
    pub status_labels: BTreeMap<String, String>,

    /// Link to a task in the Deskfy UI; `{task_id}` is substituted
    #[serde(default = "default_task_url_template")]
    pub task_url_template: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_task_url_template() -> String {
    "https://app.deskfy.io/workflow/home?createRequest=&request={task_id}".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            slack: SlackConfig::default(),
            store: StoreConfig::default(),
            filters: FilterConfig::default(),
            status_labels: BTreeMap::new(),
            task_url_template: default_task_url_template(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Whether list cards are kept for tasks.
    pub fn cards_enabled(&self) -> bool {
        self.slack.card_channel.is_some()
    }

    /// Whether anything needs the correlation store.
    pub fn store_required(&self) -> bool {
        self.cards_enabled() || self.store.remember_titles
    }

    /// Copy of the configuration with credentials replaced by [`REDACTED`].
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        let hide = |secret: &mut Option<String>| {
            if secret.is_some() {
                *secret = Some(REDACTED.to_string());
            }
        };
        hide(&mut config.slack.bot_token);
        hide(&mut config.store.rest_token);
        hide(&mut config.server.shared_secret);
        config
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path receiving Deskfy webhooks
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    /// Optional shared secret expected in `x-relay-token` or `?token=`
    #[serde(default)]
    pub shared_secret: Option<String>,

    /// Upper bound on handling one webhook, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_webhook_path() -> String {
    "/deskfy".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_path: default_webhook_path(),
            shared_secret: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Slack Web API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`)
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Web API base URL
    #[serde(default = "default_slack_api_base_url")]
    pub api_base_url: String,

    /// Channel receiving one log message per admissible event
    #[serde(default)]
    pub log_channel: Option<String>,

    /// Channel holding one card per task; cards are disabled when unset
    #[serde(default)]
    pub card_channel: Option<String>,

    /// HTTP timeout for Slack calls, in seconds
    #[serde(default = "default_client_timeout_secs")]
    pub timeout_secs: u64,

    /// Client-side cap on Slack calls per second
    #[serde(default = "default_max_requests_per_second")]
    pub max_requests_per_second: u32,
}

fn default_slack_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

const fn default_client_timeout_secs() -> u64 {
    10
}

const fn default_max_requests_per_second() -> u32 {
    5
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base_url: default_slack_api_base_url(),
            log_channel: None,
            card_channel: None,
            timeout_secs: default_client_timeout_secs(),
            max_requests_per_second: default_max_requests_per_second(),
        }
    }
}

/// Correlation store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Upstash-compatible Redis REST endpoint (Vercel KV)
    #[default]
    Rest,
    /// Process memory; single-instance development only
    Memory,
}

/// Correlation store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreConfig {
    /// Backend kind
    #[serde(default)]
    pub backend: StoreBackend,

    /// REST endpoint URL
    #[serde(default)]
    pub rest_url: Option<String>,

    /// REST bearer token
    #[serde(default)]
    pub rest_token: Option<String>,

    /// Key prefix for every record written by the relay
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// HTTP timeout for store calls, in seconds
    #[serde(default = "default_client_timeout_secs")]
    pub timeout_secs: u64,

    /// Remember task titles so untitled follow-up events keep their title
    #[serde(default)]
    pub remember_titles: bool,
}

fn default_namespace() -> String {
    "deskfy".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            rest_url: None,
            rest_token: None,
            namespace: default_namespace(),
            timeout_secs: default_client_timeout_secs(),
            remember_titles: false,
        }
    }
}

/// Filtering policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FilterConfig {
    /// Fields the GEO block-list inspects
    #[serde(default)]
    pub geo_target: GeoTarget,

    /// Blocked GEO markers
    #[serde(default)]
    pub blocked_geo: Vec<MatchRule>,

    /// Blocked designers / comment authors
    #[serde(default)]
    pub blocked_authors: Vec<MatchRule>,

    /// Ignore comment events whose payload carries no title
    #[serde(default)]
    pub suppress_untitled_comments: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
