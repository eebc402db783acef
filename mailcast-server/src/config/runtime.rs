//! Runtime configuration re-exports.
//!
//! The validated config types live in `mailcast_core::config`.

pub use mailcast_core::config::{PublisherConfig, ServerConfig, SharedConfig, SubscriberConfig};
