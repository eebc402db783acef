//! Plain HTTP client for `/ping` and `/publish`.

use reqwest::{Client, StatusCode};
use url::Url;

use super::ClientError;
use crate::objects::notification::TOPIC_ARN_HEADER;
use crate::objects::ping::{PingRequest, PongResponse};

/// Typed HTTP client for the non-streaming endpoints.
#[derive(Debug, Clone)]
pub struct ProbeClient {
    http: Client,
    base_url: Url,
}

impl ProbeClient {
    /// Create a new `ProbeClient` rooted at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /ping` - liveness probe.
    pub async fn ping(&self) -> Result<PongResponse, ClientError> {
        let url = self.base_url.join("/ping")?;
        let resp = self
            .http
            .post(url)
            .json(&PingRequest { ping: true })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(ClientError::Json)
    }

    /// `POST /publish` - deliver a raw SNS notification body, as SNS would.
    ///
    /// Returns the response status rather than failing on 4xx so callers
    /// can assert on rejections.
    pub async fn publish_raw(
        &self,
        topic_arn: &str,
        body: impl Into<String>,
    ) -> Result<StatusCode, ClientError> {
        let url = self.base_url.join("/publish")?;
        let resp = self
            .http
            .post(url)
            .header(TOPIC_ARN_HEADER, topic_arn)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=UTF-8")
            .body(body.into())
            .send()
            .await?;
        Ok(resp.status())
    }
}
