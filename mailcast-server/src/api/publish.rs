use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mailcast_core::decoder::{DecodeError, decode_notification};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;

use crate::api::extractors::VerifiedTopic;
use crate::state::AppState;

/// Largest webhook body accepted, in bytes.
pub const PUBLISH_BODY_LIMIT: usize = 8192;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("request body exceeds {PUBLISH_BODY_LIMIT} bytes")]
    PayloadTooLarge,
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl IntoResponse for PublishError {
    fn into_response(self) -> Response {
        match self {
            PublishError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Request Entity Too Large").into_response()
            }
            PublishError::Decode(_) => (StatusCode::BAD_REQUEST, "Bad Request").into_response(),
        }
    }
}

/// `POST /publish` - SNS webhook.
///
/// Decodes the notification, fans it out to the campaign's subscribers and
/// queues the receipt write-back. Neither step waits on a subscriber or on
/// the database.
pub(super) async fn publish(
    State(state): State<AppState>,
    _topic: VerifiedTopic,
    body: Body,
) -> Result<StatusCode, PublishError> {
    let raw_body = axum::body::to_bytes(body, PUBLISH_BODY_LIMIT)
        .await
        .map_err(|_| PublishError::PayloadTooLarge)?;

    let notification = decode_notification(&raw_body)?;
    let event = Arc::new(notification.into_event());
    tracing::debug!(
        campaign_id = %event.campaign_id,
        donor_id = %event.donor_id,
        email_id = %event.email_id,
        status = %event.status,
        "Event received"
    );

    let report = state
        .channels
        .get_or_create(&event.campaign_id)
        .publish(Arc::clone(&event));
    tracing::debug!(
        campaign_id = %event.campaign_id,
        delivered = report.delivered,
        evicted = report.evicted,
        "Event published"
    );

    match state.status_tx.try_send(event.to_status_update()) {
        Ok(()) => {}
        Err(TrySendError::Full(update)) => {
            tracing::warn!(
                campaign_id = %update.campaign_id,
                donor_id = %update.donor_id,
                status = %update.status,
                "Write-back queue full, dropping receipt status update"
            );
        }
        Err(TrySendError::Closed(_)) => {
            tracing::error!("Write-back queue closed, receipt status not recorded");
        }
    }

    Ok(StatusCode::ACCEPTED)
}
