pub mod card;
pub mod config;
pub mod event;
pub mod filter;
pub mod notification;

pub use card::{card_key, title_key, CardLocator};
pub use config::{
    Config, FilterConfig, LoggingConfig, ServerConfig, SlackConfig, StoreBackend, StoreConfig,
};
pub use event::{decode_body, EventKind, InboundEvent};
pub use filter::{GeoTarget, MatchKind, MatchRule};
pub use notification::NotificationRecord;
