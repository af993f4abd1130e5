//! `replay`: push one saved webhook payload through the relay.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use serde::Serialize;

use crate::adapters::recording::ChatCall;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{decode_body, Config};
use crate::infrastructure::setup::{build_dry_run_relay, build_relay};
use crate::services::relay::RelayOutcome;

/// Arguments for `replay`.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// File holding the webhook body
    pub file: PathBuf,

    /// Record chat traffic locally instead of calling Slack and the store
    #[arg(long)]
    pub dry_run: bool,
}

/// A message the dry run would have sent.
#[derive(Debug, Serialize)]
pub struct RecordedMessage {
    /// `post` or `update`.
    pub action: &'static str,
    /// Target channel.
    pub channel: String,
    /// Message body.
    pub text: String,
}

impl From<ChatCall> for RecordedMessage {
    fn from(call: ChatCall) -> Self {
        match call {
            ChatCall::Post { channel, text } => Self {
                action: "post",
                channel,
                text,
            },
            ChatCall::Update { channel, text, .. } => Self {
                action: "update",
                channel,
                text,
            },
        }
    }
}

/// Result of replaying one payload.
#[derive(Debug, Serialize)]
pub struct ReplayOutput {
    /// Replayed file.
    pub file: String,
    /// `delivered` or `ignored`.
    pub status: &'static str,
    /// Event name, when delivered.
    pub event: Option<String>,
    /// Task ID, when the payload had one.
    pub task_id: Option<String>,
    /// Ignore code, when filtered.
    pub ignored: Option<String>,
    /// Why the event was filtered.
    pub reason: Option<String>,
    /// Whether the log message went out; `None` with no log channel.
    pub log_posted: Option<bool>,
    /// Card sync outcome label; `None` with cards disabled.
    pub card: Option<&'static str>,
    /// Chat traffic recorded by a dry run.
    pub messages: Vec<RecordedMessage>,
}

impl ReplayOutput {
    fn new(file: String, outcome: RelayOutcome, messages: Vec<RecordedMessage>) -> Self {
        let mut out = Self {
            file,
            status: "delivered",
            event: None,
            task_id: None,
            ignored: None,
            reason: None,
            log_posted: None,
            card: None,
            messages,
        };
        match outcome {
            RelayOutcome::Ignored(reason) => {
                out.status = "ignored";
                out.ignored = Some(reason.code().to_string());
                out.reason = Some(reason.description());
            }
            RelayOutcome::Delivered {
                event,
                task_id,
                log_posted,
                card,
            } => {
                out.event = Some(event.to_string());
                out.task_id = task_id;
                out.log_posted = log_posted;
                out.card = card.as_ref().map(|c| c.label());
            }
        }
        out
    }
}

impl CommandOutput for ReplayOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("{} {}", style("Replayed").bold(), self.file)];

        if let Some(ref code) = self.ignored {
            lines.push(format!(
                "  {} ignored ({code}): {}",
                style("!").yellow(),
                self.reason.as_deref().unwrap_or_default()
            ));
        } else {
            lines.push(format!(
                "  {} {} task {}",
                style("✓").green(),
                self.event.as_deref().unwrap_or("-"),
                self.task_id.as_deref().unwrap_or("-")
            ));
            let log = match self.log_posted {
                Some(true) => style("posted").green(),
                Some(false) => style("failed").red(),
                None => style("disabled").dim(),
            };
            lines.push(format!("  log message: {log}"));
            let card = self.card.unwrap_or("disabled");
            let card = if card.ends_with("failed") {
                style(card).red()
            } else {
                style(card).cyan()
            };
            lines.push(format!("  card:        {card}"));
        }

        for message in &self.messages {
            lines.push(format!(
                "\n{} {}",
                style(message.action).dim(),
                style(&message.channel).yellow()
            ));
            lines.push(message.text.clone());
        }
        lines.join("\n")
    }
}

/// Run the payload in `args.file` through the relay and print the outcome.
pub async fn execute(args: ReplayArgs, config: Config, json_mode: bool) -> Result<()> {
    let raw = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let payload = decode_body(&raw);

    let (outcome, messages) = if args.dry_run {
        let (relay, chat) = build_dry_run_relay(&config)?;
        let outcome = relay.process(&payload).await;
        let messages = chat.calls().into_iter().map(RecordedMessage::from).collect();
        (outcome, messages)
    } else {
        (build_relay(&config)?.process(&payload).await, Vec::new())
    };

    output(
        &ReplayOutput::new(args.file.display().to_string(), outcome, messages),
        json_mode,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_dry_run_replay_of_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"event":"UPDATE_TASK","data":{{"id":"77","name":"Banner","status":"DONE"}}}}"#
        )
        .unwrap();

        let args = ReplayArgs {
            file: file.path().to_path_buf(),
            dry_run: true,
        };
        execute(args, Config::default(), true).await.unwrap();
    }

    #[test]
    fn test_output_for_ignored_event() {
        let out = ReplayOutput::new(
            "payload.json".to_string(),
            RelayOutcome::Ignored(crate::services::filters::IgnoreReason::UntitledComment),
            Vec::new(),
        );
        assert_eq!(out.status, "ignored");
        assert_eq!(out.ignored.as_deref(), Some("untitled_comment"));
        assert!(out.to_human().contains("untitled_comment"));
    }

    #[test]
    fn test_recorded_message_from_update() {
        let message = RecordedMessage::from(ChatCall::Update {
            channel: "C1".to_string(),
            message_ref: "ts-1".to_string(),
            text: "*Banner*".to_string(),
        });
        assert_eq!(message.action, "update");
        assert_eq!(message.channel, "C1");
    }
}
