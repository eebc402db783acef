//! HTTP API handlers.
//!
//! # Endpoints
//!
//! - `GET  /`                         - usage hint
//! - `POST /publish`                  - SNS webhook, requires the topic header
//! - `POST /ping`                     - liveness probe
//! - `GET  /subscribe/{campaign_id}`  - WebSocket campaign status stream

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod extractors;
mod ping;
mod publish;
mod subscribe;

pub use ping::PING_BODY_LIMIT;
pub use publish::PUBLISH_BODY_LIMIT;

/// Body of `GET /`.
pub const USAGE: &str = "Go to wss:*/subscribe/campaignId to connect";

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(usage))
        .route("/publish", post(publish::publish))
        .route("/ping", post(ping::ping))
        .route("/subscribe", get(subscribe::missing_campaign))
        .route("/subscribe/", get(subscribe::missing_campaign))
        .route("/subscribe/{*campaign_id}", get(subscribe::subscribe))
}

async fn usage() -> &'static str {
    USAGE
}
