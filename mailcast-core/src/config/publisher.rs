/// Settings for `POST /publish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherConfig {
    /// SNS topic ARN a notification must be published to. Compared against
    /// the `x-amz-sns-topic-arn` header.
    pub topic_arn: String,
}

impl PublisherConfig {
    /// Exact byte comparison against a received topic header.
    pub fn topic_matches(&self, received: &[u8]) -> bool {
        self.topic_arn.as_bytes() == received
    }
}
