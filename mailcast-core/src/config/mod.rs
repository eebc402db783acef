//! Configuration types for mailcast.
//!
//! These types represent the validated runtime configuration used by the server
//! and can be shared across crates. The actual config loading/parsing is handled
//! by the server crate.

mod publisher;
mod server;
mod subscriber;

pub use publisher::PublisherConfig;
pub use server::ServerConfig;
pub use subscriber::SubscriberConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// The reloadable configuration sections, each behind its own lock.
///
/// [`ServerConfig`] is fixed at startup and is not shared.
#[derive(Clone)]
pub struct SharedConfig {
    /// Webhook authentication.
    pub publisher: Arc<RwLock<PublisherConfig>>,
    /// WebSocket origin policy.
    pub subscriber: Arc<RwLock<SubscriberConfig>>,
}

impl SharedConfig {
    pub fn new(publisher: PublisherConfig, subscriber: SubscriberConfig) -> Self {
        Self {
            publisher: Arc::new(RwLock::new(publisher)),
            subscriber: Arc::new(RwLock::new(subscriber)),
        }
    }
}
