//! SNS/SES webhook decoding.
//!
//! [`decode_notification`] turns the raw `POST /publish` body into the
//! `(campaign, donor, email, status)` tuple the broadcaster needs. It is a
//! pure function apart from logging: every rejection is reported with the
//! offending payload so bad deliveries can be replayed by hand.

mod unescape;

pub use unescape::unescape_in_place;

use crate::events::NormalizedEvent;
use compact_str::CompactString;
use mailcast_sdk::objects::DeliveryStatus;
use mailcast_sdk::objects::notification::{
    CAMPAIGN_ID_HEADER, DONOR_ID_HEADER, NOTIFICATION_TYPE, NotificationEnvelope, SesEvent,
};
use thiserror::Error;
use tracing::warn;

/// Reasons a webhook body is rejected.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The outer SNS envelope is not valid JSON.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    /// The envelope parsed but is not a usable notification.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(&'static str),

    /// The unescaped `Message` is not a valid SES event.
    #[error("malformed message: {0}")]
    MalformedMessage(#[source] serde_json::Error),

    /// A required field or header is missing or empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// The fields of a notification the broadcaster cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedNotification {
    pub campaign_id: CompactString,
    pub donor_id: CompactString,
    pub email_id: CompactString,
    pub status: DeliveryStatus,
}

impl DecodedNotification {
    /// Stamp the notification with the current instant.
    pub fn into_event(self) -> NormalizedEvent {
        NormalizedEvent::new(self.campaign_id, self.donor_id, self.email_id, self.status)
    }
}

/// Decode a raw SNS notification body.
pub fn decode_notification(raw_body: &[u8]) -> Result<DecodedNotification, DecodeError> {
    decode(raw_body).inspect_err(|e| {
        warn!(
            error = %e,
            raw_body = %String::from_utf8_lossy(raw_body),
            "Rejected notification"
        );
    })
}

fn decode(raw_body: &[u8]) -> Result<DecodedNotification, DecodeError> {
    let envelope: NotificationEnvelope =
        serde_json::from_slice(raw_body).map_err(DecodeError::MalformedEnvelope)?;

    if envelope.kind != NOTIFICATION_TYPE {
        return Err(DecodeError::InvalidEnvelope("unexpected envelope type"));
    }

    let message = envelope
        .message
        .ok_or(DecodeError::InvalidEnvelope("empty message"))?;
    let mut message = message.get().as_bytes().to_vec();
    let text = unescape_in_place(&mut message);

    let event: SesEvent = serde_json::from_slice(text).map_err(DecodeError::MalformedMessage)?;

    if event.event_type.is_empty() {
        return Err(DecodeError::MissingField("eventType"));
    }
    if event.mail.message_id.is_empty() {
        return Err(DecodeError::MissingField("mail.messageId"));
    }

    let campaign_id = event
        .mail
        .last_header(CAMPAIGN_ID_HEADER)
        .ok_or(DecodeError::MissingField(CAMPAIGN_ID_HEADER))?;
    let donor_id = event
        .mail
        .last_header(DONOR_ID_HEADER)
        .ok_or(DecodeError::MissingField(DONOR_ID_HEADER))?;

    Ok(DecodedNotification {
        campaign_id: campaign_id.into(),
        donor_id: donor_id.into(),
        email_id: event.mail.message_id.as_str().into(),
        status: DeliveryStatus::from_event_type(&event.event_type),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A notification as SNS actually delivers it.
    const SNS_SEND_NOTIFICATION: &str = r#"{
"Type" : "Notification",
"MessageId" : "test-message-id",
"TopicArn" : "arn:aws:sns:us-east-2:test-profile-id:ses-events",
"Subject" : "Amazon SES Email Event Notification",
"Message" : "{\"eventType\":\"Send\",\"mail\":{\"timestamp\":\"2024-03-11T14:47:59.955Z\",\"source\":\"email@donationreceipt.online\",\"sourceArn\":\"arn:aws:ses:us-east-2:test:identity/donationreceipt.online\",\"sendingAccountId\":\"test\",\"messageId\":\"test-message-id\",\"destination\":[\"email@simulator.amazonses.com\"],\"headersTruncated\":false,\"headers\":[{\"name\":\"Content-Type\",\"value\":\"text/plain; charset=utf-8\"},{\"name\":\"X-Ses-Configuration-Set\",\"value\":\"event-listener\"},{\"name\":\"X-Data-Campaign-ID\",\"value\":\"test-campaign-id\"},{\"name\":\"X-Data-Donor-ID\",\"value\":\"test-donor-id\"},{\"name\":\"From\",\"value\":\"contact@donationreceipt.online\"},{\"name\":\"To\",\"value\":\"success@simulator.amazonses.com\"},{\"name\":\"Subject\",\"value\":\"test\"},{\"name\":\"Message-ID\",\"value\":\"<test-email-id@donationreceipt.online>\"},{\"name\":\"Content-Transfer-Encoding\",\"value\":\"7bit\"},{\"name\":\"Date\",\"value\":\"Mon, 11 Mar 2024 14:47:59 +0000\"},{\"name\":\"MIME-Version\",\"value\":\"1.0\"}],\"commonHeaders\":{\"from\":[\"contact@donationreceipt.online\"],\"date\":\"Mon, 11 Mar 2024 14:47:59 +0000\",\"to\":[\"success@simulator.amazonses.com\"],\"messageId\":\"test-message-id\",\"subject\":\"test\"},\"tags\":{\"ses:source-tls-version\":[\"TLSv1.3\"],\"ses:operation\":[\"SendRawEmail\"],\"ses:configuration-set\":[\"event-listener\"],\"ses:source-ip\":[\"92.22.4.86\"],\"ses:from-domain\":[\"donationreceipt.online\"],\"ses:caller-identity\":[\"root\"]}},\"send\":{}}\n",
"Timestamp" : "2024-03-11T14:48:00.136Z",
"SignatureVersion" : "1",
"Signature" : "test.signature.png",
"SigningCertURL" : "https://sns.us-east-2.amazonaws.com/",
"UnsubscribeURL" : "https://sns.us-east-2.amazonaws.com/"
}"#;

    /// Wrap an SES event the way SNS does: JSON-string-encode it and append
    /// the escaped trailing newline.
    fn envelope(kind: &str, ses_event: &serde_json::Value) -> String {
        let inner = format!("{}\n", ses_event);
        serde_json::json!({
            "Type": kind,
            "TopicArn": "arn:aws:sns:us-east-1:1:ses",
            "Message": inner,
        })
        .to_string()
    }

    fn ses_event(event_type: &str, headers: &[(&str, &str)]) -> serde_json::Value {
        let headers: Vec<_> = headers
            .iter()
            .map(|(name, value)| serde_json::json!({ "name": name, "value": value }))
            .collect();
        serde_json::json!({
            "eventType": event_type,
            "mail": { "messageId": "E", "headers": headers },
        })
    }

    #[test]
    fn test_decode_real_sns_payload() {
        let decoded = decode_notification(SNS_SEND_NOTIFICATION.as_bytes()).unwrap();
        assert_eq!(decoded.campaign_id, "test-campaign-id");
        assert_eq!(decoded.donor_id, "test-donor-id");
        assert_eq!(decoded.email_id, "test-message-id");
        assert_eq!(decoded.status, DeliveryStatus::Sent);
    }

    #[test]
    fn test_decode_send() {
        let body = envelope(
            "Notification",
            &ses_event("Send", &[(CAMPAIGN_ID_HEADER, "C"), (DONOR_ID_HEADER, "D")]),
        );
        let decoded = decode_notification(body.as_bytes()).unwrap();
        assert_eq!(
            decoded,
            DecodedNotification {
                campaign_id: "C".into(),
                donor_id: "D".into(),
                email_id: "E".into(),
                status: DeliveryStatus::Sent,
            }
        );
    }

    #[test]
    fn test_decode_delivery_and_unknown_types() {
        let headers = [(CAMPAIGN_ID_HEADER, "C"), (DONOR_ID_HEADER, "D")];

        let body = envelope("Notification", &ses_event("Delivery", &headers));
        assert_eq!(
            decode_notification(body.as_bytes()).unwrap().status,
            DeliveryStatus::Delivered
        );

        let body = envelope("Notification", &ses_event("Teleported", &headers));
        assert_eq!(
            decode_notification(body.as_bytes()).unwrap().status,
            DeliveryStatus::NotSent
        );
    }

    #[test]
    fn test_duplicate_headers_last_wins() {
        let body = envelope(
            "Notification",
            &ses_event(
                "Open",
                &[
                    (CAMPAIGN_ID_HEADER, "first-campaign"),
                    (DONOR_ID_HEADER, "D"),
                    (CAMPAIGN_ID_HEADER, "last-campaign"),
                ],
            ),
        );
        let decoded = decode_notification(body.as_bytes()).unwrap();
        assert_eq!(decoded.campaign_id, "last-campaign");
        assert_eq!(decoded.status, DeliveryStatus::Opened);
    }

    #[test]
    fn test_rejects_wrong_envelope_type() {
        let body = envelope(
            "SubscriptionConfirmation",
            &ses_event("Send", &[(CAMPAIGN_ID_HEADER, "C"), (DONOR_ID_HEADER, "D")]),
        );
        assert!(matches!(
            decode_notification(body.as_bytes()),
            Err(DecodeError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn test_rejects_missing_message() {
        let body = r#"{"Type":"Notification"}"#;
        assert!(matches!(
            decode_notification(body.as_bytes()),
            Err(DecodeError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_json_at_both_levels() {
        assert!(matches!(
            decode_notification(b"{not json"),
            Err(DecodeError::MalformedEnvelope(_))
        ));

        let body = r#"{"Type":"Notification","Message":"{\"eventType\": oops}"}"#;
        assert!(matches!(
            decode_notification(body.as_bytes()),
            Err(DecodeError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_rejects_missing_headers() {
        let body = envelope("Notification", &ses_event("Send", &[(DONOR_ID_HEADER, "D")]));
        assert!(matches!(
            decode_notification(body.as_bytes()),
            Err(DecodeError::MissingField(CAMPAIGN_ID_HEADER))
        ));

        let body = envelope(
            "Notification",
            &ses_event("Send", &[(CAMPAIGN_ID_HEADER, "C")]),
        );
        assert!(matches!(
            decode_notification(body.as_bytes()),
            Err(DecodeError::MissingField(DONOR_ID_HEADER))
        ));
    }

    #[test]
    fn test_rejects_empty_event_type_or_message_id() {
        let headers = [(CAMPAIGN_ID_HEADER, "C"), (DONOR_ID_HEADER, "D")];
        let body = envelope("Notification", &ses_event("", &headers));
        assert!(matches!(
            decode_notification(body.as_bytes()),
            Err(DecodeError::MissingField("eventType"))
        ));

        let event = serde_json::json!({
            "eventType": "Send",
            "mail": { "headers": [
                { "name": CAMPAIGN_ID_HEADER, "value": "C" },
                { "name": DONOR_ID_HEADER, "value": "D" },
            ]},
        });
        let body = envelope("Notification", &event);
        assert!(matches!(
            decode_notification(body.as_bytes()),
            Err(DecodeError::MissingField("mail.messageId"))
        ));
    }

    #[test]
    fn test_header_without_value_is_tolerated() {
        let event = serde_json::json!({
            "eventType": "Delivery",
            "mail": { "messageId": "E", "headers": [
                { "name": "X-Unrelated" },
                { "name": CAMPAIGN_ID_HEADER, "value": "C" },
                { "name": DONOR_ID_HEADER, "value": "D" },
            ]},
        });
        let body = envelope("Notification", &event);
        let decoded = decode_notification(body.as_bytes()).unwrap();
        assert_eq!(decoded.campaign_id, "C");
        assert_eq!(decoded.status, DeliveryStatus::Delivered);
    }
}
