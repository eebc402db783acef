//! Event type definitions.

use compact_str::CompactString;
use mailcast_sdk::objects::{DeliveryStatus, SubscriberEvent};
use tokio::time::Instant;

/// A decoded delivery notification, ready for fan-out.
///
/// Immutable once constructed. The buffer and every subscriber queue share
/// one allocation through `Arc<NormalizedEvent>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub campaign_id: CompactString,
    pub donor_id: CompactString,
    /// The SES message id of the email.
    pub email_id: CompactString,
    pub status: DeliveryStatus,
    /// Monotonic receive time, used for the retention window.
    pub created_at: Instant,
}

impl NormalizedEvent {
    /// Build an event stamped with the current (tokio) instant.
    pub fn new(
        campaign_id: impl Into<CompactString>,
        donor_id: impl Into<CompactString>,
        email_id: impl Into<CompactString>,
        status: DeliveryStatus,
    ) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            donor_id: donor_id.into(),
            email_id: email_id.into(),
            status,
            created_at: Instant::now(),
        }
    }

    /// The frame subscribers receive for this event.
    pub fn to_wire(&self) -> SubscriberEvent {
        SubscriberEvent {
            donor_id: self.donor_id.clone(),
            status: self.status,
        }
    }

    /// The write-back request for this event.
    pub fn to_status_update(&self) -> ReceiptStatusUpdate {
        ReceiptStatusUpdate {
            campaign_id: self.campaign_id.clone(),
            donor_id: self.donor_id.clone(),
            email_id: self.email_id.clone(),
            status: self.status,
        }
    }
}

/// Request to persist the latest email status of one receipt.
///
/// Receipts are keyed by `(campaign_id, donor_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptStatusUpdate {
    pub campaign_id: CompactString,
    pub donor_id: CompactString,
    pub email_id: CompactString,
    pub status: DeliveryStatus,
}
