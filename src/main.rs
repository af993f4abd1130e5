//! Deskfy Relay CLI entry point.

use anyhow::Result;
use clap::Parser;

use deskfy_relay::cli::{commands, handle_error, Cli, Commands};
use deskfy_relay::infrastructure::logging::{LogConfig, LoggerImpl};
use deskfy_relay::ConfigLoader;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json_mode);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ConfigLoader::load(cli.config.as_deref())?;

    let mut log_config = LogConfig::try_from(&config.logging)?;
    if !matches!(cli.command, Commands::Serve(_)) {
        // One-shot commands print their own output; keep logs to problems.
        log_config.level = "warn".to_string();
    }
    let _logger = LoggerImpl::init(&log_config)?;

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, config).await,
        Commands::Config => commands::config::execute(&config, cli.json),
        Commands::Replay(args) => commands::replay::execute(args, config, cli.json).await,
    }
}
