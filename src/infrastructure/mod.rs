//! Infrastructure layer module
//!
//! This module contains the ambient infrastructure of the relay:
//! - Configuration management
//! - Logging infrastructure
//! - Relay assembly from configuration

pub mod config;
pub mod logging;
pub mod setup;
