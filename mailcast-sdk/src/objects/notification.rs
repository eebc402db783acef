//! Inbound webhook payloads.
//!
//! SES publishes email events to an SNS topic, and SNS POSTs them to us
//! wrapped in an envelope whose `Message` field is the SES event encoded as
//! a JSON string:
//!
//! ```json
//! {
//!   "Type": "Notification",
//!   "TopicArn": "arn:aws:sns:us-east-2:123:ses-events",
//!   "Message": "{\"eventType\":\"Send\",\"mail\":{ ... }}\n"
//! }
//! ```
//!
//! Only the fields the server reads are modelled; everything else is
//! ignored during deserialization.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Envelope `Type` accepted by the publish endpoint.
pub const NOTIFICATION_TYPE: &str = "Notification";

/// Header SNS uses to name the topic a message was published to.
pub const TOPIC_ARN_HEADER: &str = "x-amz-sns-topic-arn";

/// Custom mail header carrying the campaign id.
pub const CAMPAIGN_ID_HEADER: &str = "X-Data-Campaign-ID";

/// Custom mail header carrying the donor id.
pub const DONOR_ID_HEADER: &str = "X-Data-Donor-ID";

/// The SNS HTTP(S) delivery envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationEnvelope {
    #[serde(rename = "Type", default)]
    pub kind: String,
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub topic_arn: String,
    /// The raw JSON text of `Message`, surrounding quotes and escapes
    /// included. Kept raw because the server applies its own unescaping.
    #[serde(default)]
    pub message: Option<Box<RawValue>>,
    #[serde(default)]
    pub timestamp: String,
}

/// An SES email sending event, as carried inside the envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SesEvent {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub mail: MailObject,
}

/// Information about the original email.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailObject {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub destination: Vec<String>,
    #[serde(default)]
    pub headers_truncated: bool,
    #[serde(default)]
    pub headers: Vec<MailHeader>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailHeader {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl MailObject {
    /// Value of the header named `name`.
    ///
    /// When a header repeats, the *last* occurrence wins. Every header is
    /// visited, matching the lookup the webhook has always done.
    pub fn last_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .filter(|header| header.name == name)
            .last()
            .map(|header| header.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_keeps_message_raw() {
        let body = r#"{"Type":"Notification","TopicArn":"arn:x","Message":"{\"a\":1}\n"}"#;
        let envelope: NotificationEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.kind, NOTIFICATION_TYPE);
        assert_eq!(envelope.topic_arn, "arn:x");
        assert_eq!(envelope.message.unwrap().get(), r#""{\"a\":1}\n""#);
    }

    #[test]
    fn test_envelope_without_message() {
        let envelope: NotificationEnvelope =
            serde_json::from_str(r#"{"Type":"Notification"}"#).unwrap();
        assert!(envelope.message.is_none());
    }

    #[test]
    fn test_last_header_wins() {
        let mail = MailObject {
            headers: vec![
                MailHeader {
                    name: DONOR_ID_HEADER.into(),
                    value: "first".into(),
                },
                MailHeader {
                    name: "From".into(),
                    value: "a@example.com".into(),
                },
                MailHeader {
                    name: DONOR_ID_HEADER.into(),
                    value: "second".into(),
                },
            ],
            ..Default::default()
        };
        assert_eq!(mail.last_header(DONOR_ID_HEADER), Some("second"));
        assert_eq!(mail.last_header("From"), Some("a@example.com"));
        assert_eq!(mail.last_header(CAMPAIGN_ID_HEADER), None);
    }

    #[test]
    fn test_header_names_are_case_sensitive() {
        let mail = MailObject {
            headers: vec![MailHeader {
                name: "x-data-campaign-id".into(),
                value: "c".into(),
            }],
            ..Default::default()
        };
        assert_eq!(mail.last_header(CAMPAIGN_ID_HEADER), None);
    }

    #[test]
    fn test_header_without_value_decodes_empty() {
        let mail: MailObject = serde_json::from_str(
            r#"{"messageId":"m","headers":[{"name":"X-Trace"},{"name":"From","value":"a@b"}]}"#,
        )
        .unwrap();
        assert_eq!(mail.last_header("X-Trace"), Some(""));
        assert_eq!(mail.last_header("From"), Some("a@b"));
    }
}
