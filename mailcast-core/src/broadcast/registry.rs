//! Campaign id -> channel map.

use super::BroadcastConfig;
use super::channel::ChannelState;
use compact_str::CompactString;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Lazily populated map of campaign channels.
///
/// Channels live for the rest of the process once created.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    config: BroadcastConfig,
    channels: Mutex<HashMap<CompactString, Arc<ChannelState>>>,
}

impl ChannelRegistry {
    pub fn new(config: BroadcastConfig) -> Self {
        Self {
            config,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Return the channel for `campaign_id`, creating it on first use.
    pub fn get_or_create(&self, campaign_id: &str) -> Arc<ChannelState> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(channel) = channels.get(campaign_id) {
            return Arc::clone(channel);
        }
        debug!(campaign_id, "Creating channel");
        let channel = Arc::new(ChannelState::new(self.config.max_event_age));
        channels.insert(campaign_id.into(), Arc::clone(&channel));
        channel
    }

    pub fn get(&self, campaign_id: &str) -> Option<Arc<ChannelState>> {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(campaign_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::SubscriberSink;
    use crate::events::NormalizedEvent;
    use mailcast_sdk::objects::DeliveryStatus;
    use std::collections::HashSet;

    #[test]
    fn test_get_or_create_returns_same_channel() {
        let registry = ChannelRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.get("c1").is_none());

        let a = registry.get_or_create("c1");
        let b = registry.get_or_create("c1");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &registry.get("c1").unwrap()));

        registry.get_or_create("c2");
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fan_out_keeps_channels_isolated() {
        const CHANNELS: usize = 3;
        const SUBSCRIBERS: usize = 4;
        // Stays within one sink's capacity so nobody is evicted.
        const EVENTS: usize = 27;

        let registry = Arc::new(ChannelRegistry::default());
        let mut sessions = Vec::new();
        for c in 0..CHANNELS {
            for _ in 0..SUBSCRIBERS {
                let registry = Arc::clone(&registry);
                sessions.push(tokio::spawn(async move {
                    let campaign = format!("campaign-{c}");
                    let channel = registry.get_or_create(&campaign);
                    let (sink, mut rx) = SubscriberSink::new(|| {});
                    let mut seen: Vec<Arc<NormalizedEvent>> = channel.subscribe(&sink);
                    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                    while let Ok(event) = rx.try_recv() {
                        seen.push(event);
                    }
                    channel.unsubscribe(sink.id());
                    (campaign, seen)
                }));
            }
        }

        let mut publishers = Vec::new();
        for m in 0..EVENTS {
            let registry = Arc::clone(&registry);
            publishers.push(tokio::spawn(async move {
                let campaign = format!("campaign-{}", m % CHANNELS);
                let event = NormalizedEvent::new(
                    campaign.as_str(),
                    format!("donor-{m}"),
                    "email",
                    DeliveryStatus::Sent,
                );
                registry.get_or_create(&campaign).publish(Arc::new(event));
            }));
        }
        for publisher in publishers {
            publisher.await.unwrap();
        }

        for session in sessions {
            let (campaign, seen) = session.await.unwrap();
            assert!(seen.iter().all(|e| e.campaign_id == campaign));

            let unique: HashSet<_> = seen.iter().map(|e| e.donor_id.clone()).collect();
            assert_eq!(unique.len(), seen.len(), "duplicate delivery on {campaign}");
            // Everything published was either replayed or delivered live.
            assert_eq!(seen.len(), EVENTS / CHANNELS);
        }
    }
}
