//! `serve`: run the webhook server until Ctrl-C.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use crate::adapters::webhook::{WebhookHttpConfig, WebhookHttpServer};
use crate::domain::models::Config;
use crate::infrastructure::setup::build_relay;

/// Arguments for `serve`.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Override the configured port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the configured bind address
    #[arg(long)]
    pub host: Option<String>,
}

/// Run the webhook server until Ctrl-C.
pub async fn execute(args: ServeArgs, config: Config) -> Result<()> {
    let relay = Arc::new(build_relay(&config)?);

    let mut http_config = WebhookHttpConfig::from(&config.server);
    if let Some(port) = args.port {
        http_config.port = port;
    }
    if let Some(host) = args.host {
        http_config.host = host;
    }

    let server = WebhookHttpServer::new(relay, http_config);
    server.serve_with_shutdown(shutdown_signal()).await?;

    tracing::info!("webhook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
