//! Slack adapter.
//!
//! [`SlackClient`] implements the chat port against the Slack Web API.

pub mod client;
pub mod models;

pub use client::SlackClient;
