//! Delivery status vocabulary.
//!
//! SES reports one of ten event types per notification. Subscribers only
//! care about a coarser status, which is what [`DeliveryStatus`] models.

use serde::{Deserialize, Serialize};

/// Normalized delivery status pushed to subscribers and written back to
/// the receipts table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    NotSent,
    Sent,
    Delivered,
    DeliveryDelayed,
    Complained,
    Bounced,
    Opened,
    Clicked,
    Subscribed,
}

impl DeliveryStatus {
    /// The wire representation, identical to the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::NotSent => "not_sent",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::DeliveryDelayed => "delivery_delayed",
            DeliveryStatus::Complained => "complained",
            DeliveryStatus::Bounced => "bounced",
            DeliveryStatus::Opened => "opened",
            DeliveryStatus::Clicked => "clicked",
            DeliveryStatus::Subscribed => "subscribed",
        }
    }

    /// Map a raw SES `eventType` tag to a status.
    ///
    /// Never fails: anything outside the known table is `NotSent`.
    pub fn from_event_type(tag: &str) -> Self {
        SesEventType::from_tag(tag).map_or(DeliveryStatus::NotSent, SesEventType::status)
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SES event types as they appear in the `eventType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SesEventType {
    Bounce,
    Complaint,
    Delivery,
    Send,
    Reject,
    Open,
    Click,
    RenderingFailure,
    DeliveryDelay,
    Subscription,
}

impl SesEventType {
    pub const ALL: [SesEventType; 10] = [
        SesEventType::Bounce,
        SesEventType::Complaint,
        SesEventType::Delivery,
        SesEventType::Send,
        SesEventType::Reject,
        SesEventType::Open,
        SesEventType::Click,
        SesEventType::RenderingFailure,
        SesEventType::DeliveryDelay,
        SesEventType::Subscription,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_tag() == tag)
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            SesEventType::Bounce => "Bounce",
            SesEventType::Complaint => "Complaint",
            SesEventType::Delivery => "Delivery",
            SesEventType::Send => "Send",
            SesEventType::Reject => "Reject",
            SesEventType::Open => "Open",
            SesEventType::Click => "Click",
            SesEventType::RenderingFailure => "Rendering Failure",
            SesEventType::DeliveryDelay => "DeliveryDelay",
            SesEventType::Subscription => "Subscription",
        }
    }

    pub fn status(self) -> DeliveryStatus {
        match self {
            SesEventType::Bounce => DeliveryStatus::Bounced,
            SesEventType::Complaint | SesEventType::Reject | SesEventType::RenderingFailure => {
                DeliveryStatus::Complained
            }
            SesEventType::Delivery => DeliveryStatus::Delivered,
            SesEventType::Send => DeliveryStatus::Sent,
            SesEventType::Open => DeliveryStatus::Opened,
            SesEventType::Click => DeliveryStatus::Clicked,
            SesEventType::DeliveryDelay => DeliveryStatus::DeliveryDelayed,
            SesEventType::Subscription => DeliveryStatus::Subscribed,
        }
    }
}
