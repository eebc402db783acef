//! WebSocket message types for the campaign status stream.
//!
//! `GET /subscribe/{campaign_id}` upgrades to a WebSocket connection and
//! pushes one [`SubscriberEvent`] text frame per email status change.
//!
//! # Protocol
//!
//! 1. Right after the upgrade the server replays every event it still
//!    buffers for the campaign (the retention window, 30 seconds by
//!    default), oldest first.
//! 2. Live events follow, in the order they were published.
//! 3. The client never needs to send anything; inbound data frames are
//!    ignored.
//! 4. A client that falls too far behind is disconnected with
//!    [`WsCloseCode::POLICY_VIOLATION`]. Server shutdown closes with
//!    [`WsCloseCode::GOING_AWAY`].

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use super::status::DeliveryStatus;

/// Server-to-client frame.
///
/// ```json
/// {"donorId":"d-42","status":"delivered"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberEvent {
    pub donor_id: CompactString,
    pub status: DeliveryStatus,
}

/// WebSocket close codes used by the status stream.
///
/// See [RFC 6455 §7.4.1](https://www.rfc-editor.org/rfc/rfc6455#section-7.4.1).
pub struct WsCloseCode;

impl WsCloseCode {
    pub const NORMAL: u16 = 1000;

    /// The server is shutting down.
    pub const GOING_AWAY: u16 = 1001;

    /// The subscriber could not keep up and was evicted.
    pub const POLICY_VIOLATION: u16 = 1008;
}

/// Close reason sent alongside [`WsCloseCode::POLICY_VIOLATION`].
pub const SLOW_CONSUMER_REASON: &str = "connection too slow to keep up with messages";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_event_shape() {
        let event = SubscriberEvent {
            donor_id: "d-42".into(),
            status: DeliveryStatus::DeliveryDelayed,
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"donorId":"d-42","status":"delivery_delayed"}"#
        );
    }
}
