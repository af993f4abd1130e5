//! `config`: print the resolved configuration with secrets redacted.

use anyhow::Result;
use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};
use serde::Serialize;

use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{Config, MatchRule};

/// Effective configuration with secrets redacted.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ConfigOutput {
    config: Config,
}

impl ConfigOutput {
    /// Redact `config` for display.
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.redacted(),
        }
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        let c = &self.config;
        let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        let rules = |rules: &[MatchRule]| {
            if rules.is_empty() {
                "-".to_string()
            } else {
                rules.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            }
        };

        vec![
            ("server.address", format!("{}:{}", c.server.host, c.server.port)),
            ("server.webhook_path", c.server.webhook_path.clone()),
            ("server.shared_secret", opt(&c.server.shared_secret)),
            ("server.request_timeout_secs", c.server.request_timeout_secs.to_string()),
            ("slack.bot_token", opt(&c.slack.bot_token)),
            ("slack.api_base_url", c.slack.api_base_url.clone()),
            ("slack.log_channel", opt(&c.slack.log_channel)),
            ("slack.card_channel", opt(&c.slack.card_channel)),
            ("slack.max_requests_per_second", c.slack.max_requests_per_second.to_string()),
            ("store.backend", format!("{:?}", c.store.backend).to_lowercase()),
            ("store.rest_url", opt(&c.store.rest_url)),
            ("store.rest_token", opt(&c.store.rest_token)),
            ("store.namespace", c.store.namespace.clone()),
            ("store.remember_titles", c.store.remember_titles.to_string()),
            ("filters.geo_target", format!("{:?}", c.filters.geo_target)),
            ("filters.blocked_geo", rules(&c.filters.blocked_geo)),
            ("filters.blocked_authors", rules(&c.filters.blocked_authors)),
            (
                "filters.suppress_untitled_comments",
                c.filters.suppress_untitled_comments.to_string(),
            ),
            ("status_labels", format!("{} override(s)", c.status_labels.len())),
            ("task_url_template", c.task_url_template.clone()),
            ("logging", format!("{} / {}", c.logging.level, c.logging.format)),
        ]
    }
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Setting").add_attribute(Attribute::Bold),
                Cell::new("Value").add_attribute(Attribute::Bold),
            ]);

        for (key, value) in self.rows() {
            table.add_row(vec![Cell::new(key), Cell::new(truncate(&value, 80))]);
        }
        table.to_string()
    }
}

/// Print the effective configuration.
pub fn execute(config: &Config, json_mode: bool) -> Result<()> {
    output(&ConfigOutput::new(config), json_mode);
    Ok(())
}
