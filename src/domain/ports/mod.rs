//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters must implement:
//! - ChatClient: Chat provider operations (post, update)
//! - CorrelationStore: Key-value storage of card locators
//!
//! These traits keep the card synchronizer and relay service independent
//! of Slack and of the store backend.

pub mod chat_client;
pub mod correlation_store;

pub use chat_client::{ChatClient, PostedMessage};
pub use correlation_store::CorrelationStore;
