//! One campaign's replay buffer and subscriber set.

use super::sink::{Offer, SinkId, SubscriberSink};
use crate::events::NormalizedEvent;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::time::Instant;

/// Fan-out counts for a single publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub evicted: usize,
}

#[derive(Debug)]
struct EventBuffer {
    events: Vec<Arc<NormalizedEvent>>,
    last_flushed: Instant,
    max_event_age: Duration,
}

impl EventBuffer {
    fn new(max_event_age: Duration) -> Self {
        Self {
            events: Vec::new(),
            last_flushed: Instant::now(),
            max_event_age,
        }
    }

    /// Drop events older than the retention window.
    ///
    /// Runs at most once per window; between runs the buffer may hold events
    /// up to twice the window old.
    fn flush(&mut self, now: Instant) {
        if now.saturating_duration_since(self.last_flushed) < self.max_event_age {
            return;
        }
        self.last_flushed = now;

        let max_age = self.max_event_age;
        match self
            .events
            .iter()
            .position(|e| now.saturating_duration_since(e.created_at) <= max_age)
        {
            Some(0) => {}
            Some(first_fresh) => {
                self.events.drain(..first_fresh);
            }
            None => self.events.clear(),
        }
    }
}

type SubscriberSet = HashMap<SinkId, Weak<SubscriberSink>>;

/// Buffered events and live subscribers of one campaign.
#[derive(Debug)]
pub struct ChannelState {
    buffer: Mutex<EventBuffer>,
    subscribers: Mutex<SubscriberSet>,
}

impl ChannelState {
    pub fn new(max_event_age: Duration) -> Self {
        Self {
            buffer: Mutex::new(EventBuffer::new(max_event_age)),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Buffer `event` and offer it to every live subscriber.
    ///
    /// Never waits on a subscriber: a full queue evicts that subscriber.
    pub fn publish(&self, event: Arc<NormalizedEvent>) -> PublishReport {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.flush(Instant::now());
        buffer.events.push(Arc::clone(&event));

        // Taken before the buffer is released so a concurrent subscribe sees
        // this event either in its snapshot or on its queue, never both.
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        drop(buffer);

        let mut report = PublishReport::default();
        subscribers.retain(|_, weak| {
            let Some(sink) = weak.upgrade() else {
                return false;
            };
            match sink.offer(&event) {
                Offer::Queued => {
                    report.delivered += 1;
                    true
                }
                Offer::Evicted => {
                    report.evicted += 1;
                    false
                }
                Offer::Closed => false,
            }
        });
        report
    }

    /// Register `sink` and return the events it must replay first.
    ///
    /// Every event in the snapshot was published before the sink joined;
    /// every later event goes to the sink's queue.
    pub fn subscribe(&self, sink: &Arc<SubscriberSink>) -> Vec<Arc<NormalizedEvent>> {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = buffer.events.clone();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sink.id(), Arc::downgrade(sink));
        drop(buffer);
        snapshot
    }

    /// Remove a sink. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SinkId) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .len()
    }
}
