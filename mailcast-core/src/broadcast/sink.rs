//! Per-connection outbound queue.

use crate::events::NormalizedEvent;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Number of undelivered events a subscriber may fall behind by before it
/// is evicted.
pub const SINK_CAPACITY: usize = 10;

/// Receiving half of a sink's queue, owned by the session.
pub type SinkReceiver = mpsc::Receiver<Arc<NormalizedEvent>>;

/// Process-unique identity of a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(u64);

impl SinkId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink-{}", self.0)
    }
}

/// Forcibly terminates the connection behind a sink.
///
/// Called at most once, from inside the channel's fan-out while its
/// subscriber lock is held, so implementations must not block.
pub trait Evict: Send + Sync {
    fn evict(&self);
}

impl<F> Evict for F
where
    F: Fn() + Send + Sync,
{
    fn evict(&self) {
        self()
    }
}

/// Outcome of [`SubscriberSink::offer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// The event is waiting in the queue.
    Queued,
    /// The queue was full; the sink has just been evicted.
    Evicted,
    /// The sink was already closed or its session is gone.
    Closed,
}

/// Bounded queue feeding one subscriber connection.
///
/// The session owns the `Arc<SubscriberSink>` and the receiver; channels only
/// hold weak references, so a session that goes away without unsubscribing
/// is pruned on the next publish.
pub struct SubscriberSink {
    id: SinkId,
    queue: mpsc::Sender<Arc<NormalizedEvent>>,
    closed: AtomicBool,
    evictor: Box<dyn Evict>,
}

impl SubscriberSink {
    /// Create a sink with a [`SINK_CAPACITY`]-slot queue.
    pub fn new(evictor: impl Evict + 'static) -> (Arc<Self>, SinkReceiver) {
        let (queue, rx) = mpsc::channel(SINK_CAPACITY);
        let sink = Arc::new(Self {
            id: SinkId::next(),
            queue,
            closed: AtomicBool::new(false),
            evictor: Box::new(evictor),
        });
        (sink, rx)
    }

    pub fn id(&self) -> SinkId {
        self.id
    }

    /// Try to enqueue `event` without waiting.
    ///
    /// A full queue evicts the subscriber instead of dropping the event.
    pub fn offer(&self, event: &Arc<NormalizedEvent>) -> Offer {
        if self.is_closed() {
            return Offer::Closed;
        }
        match self.queue.try_send(Arc::clone(event)) {
            Ok(()) => Offer::Queued,
            Err(TrySendError::Full(_)) => {
                self.evict();
                Offer::Evicted
            }
            Err(TrySendError::Closed(_)) => {
                self.closed.store(true, Ordering::Release);
                Offer::Closed
            }
        }
    }

    /// Mark the sink closed and run the eviction capability once.
    pub fn evict(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.evictor.evict();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SubscriberSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberSink")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailcast_sdk::objects::DeliveryStatus;
    use std::sync::atomic::AtomicUsize;

    fn event(donor: &str) -> Arc<NormalizedEvent> {
        Arc::new(NormalizedEvent::new("c", donor, "e", DeliveryStatus::Sent))
    }

    fn counting_sink() -> (Arc<SubscriberSink>, SinkReceiver, Arc<AtomicUsize>) {
        let evictions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evictions);
        let (sink, rx) = SubscriberSink::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (sink, rx, evictions)
    }

    #[test]
    fn test_sink_ids_are_unique() {
        let (a, _rx_a, _) = counting_sink();
        let (b, _rx_b, _) = counting_sink();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_eleventh_offer_evicts() {
        let (sink, _rx, evictions) = counting_sink();
        for i in 0..SINK_CAPACITY {
            assert_eq!(sink.offer(&event(&i.to_string())), Offer::Queued);
        }
        assert_eq!(sink.offer(&event("overflow")), Offer::Evicted);
        assert!(sink.is_closed());
        assert_eq!(evictions.load(Ordering::SeqCst), 1);

        // Later offers and explicit evictions do not re-run the capability.
        assert_eq!(sink.offer(&event("late")), Offer::Closed);
        sink.evict();
        assert_eq!(evictions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_draining_frees_slots() {
        let (sink, mut rx, evictions) = counting_sink();
        for i in 0..SINK_CAPACITY {
            sink.offer(&event(&i.to_string()));
        }
        let first = rx.try_recv().unwrap();
        assert_eq!(first.donor_id, "0");
        assert_eq!(sink.offer(&event("next")), Offer::Queued);
        assert_eq!(evictions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_offer_after_receiver_dropped() {
        let (sink, rx, evictions) = counting_sink();
        drop(rx);
        assert_eq!(sink.offer(&event("d")), Offer::Closed);
        assert!(sink.is_closed());
        assert_eq!(evictions.load(Ordering::SeqCst), 0);
    }
}
