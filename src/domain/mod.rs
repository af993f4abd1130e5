//! Domain layer for the Deskfy relay
//!
//! This module contains the relay's models and the ports its adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{DomainError, DomainResult};
