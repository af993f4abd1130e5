//! Application services.
//!
//! - [`relay`]: the webhook pipeline
//! - [`card_sync`]: one in-place card per task
//! - [`filters`], [`rendering`], [`status_labels`]: pure helpers used by the pipeline

pub mod card_sync;
pub mod filters;
pub mod relay;
pub mod rendering;
pub mod status_labels;

pub use card_sync::{CardSynchronizer, SyncOutcome};
pub use filters::{FilterEngine, IgnoreReason};
pub use relay::{RelayOutcome, RelayService, RelayStats, StatsSnapshot};
pub use status_labels::StatusLabels;
