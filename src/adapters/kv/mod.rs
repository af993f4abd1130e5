//! Correlation store adapters.

pub mod memory;
pub mod rest;

pub use memory::InMemoryStore;
pub use rest::RestKvStore;
