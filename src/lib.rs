//! Deskfy Relay
//!
//! Receives Deskfy task webhooks, posts a formatted log message to Slack for
//! each event, and keeps exactly one card message per task in a list
//! channel, editing it in place as the task changes.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and the chat/store ports
//! - **Service Layer** (`services`): the relay pipeline and card synchronizer
//! - **Adapters** (`adapters`): Slack, the KV stores and the webhook server
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, assembly
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use deskfy_relay::{infrastructure::setup::build_relay, ConfigLoader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load(None)?;
//!     let relay = build_relay(&config)?;
//!     relay.process(&serde_json::json!({"event": "NEW_TASK", "data": {"id": 1}})).await;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{CardLocator, Config, InboundEvent, NotificationRecord};
pub use domain::ports::{ChatClient, CorrelationStore, PostedMessage};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CardSynchronizer, RelayOutcome, RelayService, SyncOutcome};
