//! Command-line interface.
//!
//! `deskfy-relay [--json] [--config <path>] <serve|config|replay>`

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

use commands::replay::ReplayArgs;
use commands::serve::ServeArgs;

#[derive(Parser, Debug)]
#[command(name = "deskfy-relay")]
#[command(about = "Relay Deskfy task webhooks to Slack", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./deskfy-relay.yaml when present)
    #[arg(short, long, global = true, env = "DESKFY_RELAY_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the webhook server
    Serve(ServeArgs),

    /// Print the resolved configuration with secrets redacted
    Config,

    /// Push a saved webhook payload through the relay
    Replay(ReplayArgs),
}

/// Report a command failure and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "error": err.to_string(),
            "caused_by": chain,
        });
        eprintln!("{body}");
    } else {
        eprintln!("{} {err}", style("error:").red().bold());
        for cause in err.chain().skip(1) {
            eprintln!("  {} {cause}", style("caused by:").dim());
        }
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["deskfy-relay", "replay", "payload.json", "--dry-run", "--json"])
            .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Replay(args) => {
                assert_eq!(args.file, PathBuf::from("payload.json"));
                assert!(args.dry_run);
            }
            other => panic!("Expected Replay, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["deskfy-relay", "--config", "relay.yaml", "serve", "-p", "8080"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("relay.yaml")));
        assert!(matches!(cli.command, Commands::Serve(ServeArgs { port: Some(8080), .. })));
    }
}
