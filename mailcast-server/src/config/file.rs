//! TOML file configuration structures.
//!
//! These structs directly map to the `mailcast.toml` file format. Every
//! section is optional.

use serde::Deserialize;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub publisher: PublisherConfig,
    pub subscriber: SubscriberConfig,
    pub broadcast: BroadcastConfig,
    pub server: ServerConfig,
}

/// Webhook section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublisherConfig {
    /// Expected SNS topic ARN. `SNS_ARN` takes precedence.
    pub topic_arn: Option<String>,
}

/// WebSocket section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubscriberConfig {
    /// Origin host patterns allowed to open a subscription.
    pub allowed_origins: Vec<String>,
}

/// Replay buffer section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BroadcastConfig {
    pub max_event_age_secs: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            max_event_age_secs: 30,
        }
    }
}

/// Listener section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// How long in-flight connections get to finish after a shutdown signal.
    pub shutdown_grace_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_ms: 100,
        }
    }
}
