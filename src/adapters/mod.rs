//! Infrastructure adapters for external systems.

pub mod kv;
pub mod recording;
pub mod slack;
pub mod webhook;
