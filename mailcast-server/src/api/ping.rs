use axum::{
    Json,
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mailcast_sdk::objects::{PingRequest, PongResponse};

/// Largest ping body accepted, in bytes.
pub const PING_BODY_LIMIT: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum PingError {
    #[error("request body exceeds {PING_BODY_LIMIT} bytes")]
    PayloadTooLarge,
    #[error("expected {{\"ping\": true}}")]
    InvalidPing,
}

impl IntoResponse for PingError {
    fn into_response(self) -> Response {
        match self {
            PingError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Request Entity Too Large").into_response()
            }
            PingError::InvalidPing => (StatusCode::BAD_REQUEST, "Bad Request").into_response(),
        }
    }
}

/// `POST /ping` - liveness probe.
pub(super) async fn ping(body: Body) -> Result<impl IntoResponse, PingError> {
    let raw_body = axum::body::to_bytes(body, PING_BODY_LIMIT)
        .await
        .map_err(|_| PingError::PayloadTooLarge)?;

    match serde_json::from_slice::<PingRequest>(&raw_body) {
        Ok(PingRequest { ping: true }) => {
            Ok((StatusCode::ACCEPTED, Json(PongResponse { pong: true })))
        }
        _ => Err(PingError::InvalidPing),
    }
}
