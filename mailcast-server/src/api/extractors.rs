//! Custom Axum extractors for request authentication.
//!
//! Provides `VerifiedTopic`, which checks the SNS topic header of a webhook
//! delivery against the configured ARN (used by `POST /publish`).

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use mailcast_sdk::objects::notification::TOPIC_ARN_HEADER;

use crate::state::AppState;

/// Proof that the request named the configured SNS topic.
pub struct VerifiedTopic;

/// Errors that can occur during topic verification.
#[derive(Debug, thiserror::Error)]
pub enum TopicError {
    #[error("missing {TOPIC_ARN_HEADER} header")]
    MissingHeader,
    #[error("unexpected topic arn {0:?}")]
    Mismatch(String),
}

impl IntoResponse for TopicError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Rejected publish request");
        (StatusCode::BAD_REQUEST, "Bad Request").into_response()
    }
}

impl FromRequestParts<AppState> for VerifiedTopic {
    type Rejection = TopicError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let received = parts
            .headers
            .get(TOPIC_ARN_HEADER)
            .ok_or(TopicError::MissingHeader)?;

        let publisher = state.config.publisher.read().await;
        if !publisher.topic_matches(received.as_bytes()) {
            return Err(TopicError::Mismatch(
                String::from_utf8_lossy(received.as_bytes()).into_owned(),
            ));
        }
        Ok(VerifiedTopic)
    }
}
