//! Inbound webhook adapter.

pub mod http;

pub use http::{WebhookHttpConfig, WebhookHttpServer, WebhookState, TOKEN_HEADER};
