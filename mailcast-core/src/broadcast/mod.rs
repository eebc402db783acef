//! Per-campaign broadcast engine.
//!
//! A [`ChannelRegistry`] maps campaign ids to lazily created
//! [`ChannelState`]s. Each channel keeps a short, time-bounded buffer of
//! recent events for replay and fans every new event out to the
//! [`SubscriberSink`]s of its live connections.
//!
//! # Lock order
//!
//! registry -> buffer -> subscribers. All three are synchronous mutexes and
//! none is held across an `.await`.

mod channel;
mod registry;
mod sink;

pub use channel::{ChannelState, PublishReport};
pub use registry::ChannelRegistry;
pub use sink::{Evict, Offer, SINK_CAPACITY, SinkId, SinkReceiver, SubscriberSink};

use std::time::Duration;

/// Default retention window for replayable events.
pub const DEFAULT_MAX_EVENT_AGE: Duration = Duration::from_secs(30);

/// Settings shared by every channel of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// How long an event stays eligible for replay.
    pub max_event_age: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            max_event_age: DEFAULT_MAX_EVENT_AGE,
        }
    }
}
