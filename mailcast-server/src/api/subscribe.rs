use axum::{
    extract::{
        Path, State,
        ws::{WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use mailcast_core::config::SubscriberConfig;
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::session;
use crate::state::AppState;

/// `GET /subscribe` and `GET /subscribe/` - no campaign id.
pub(super) async fn missing_campaign() -> StatusCode {
    StatusCode::BAD_REQUEST
}

/// `GET /subscribe/{campaign_id}` - WebSocket campaign status stream.
///
/// The campaign id and origin are checked before the upgrade. The
/// connection replays the campaign's buffered events, then streams live
/// [`SubscriberEvent`](mailcast_sdk::objects::SubscriberEvent) frames.
pub(super) async fn subscribe(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if campaign_id.is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    if !origin_allowed(&headers, &*state.config.subscriber.read().await) {
        tracing::warn!(
            %campaign_id,
            origin = ?headers.get(header::ORIGIN),
            "Rejected subscription from disallowed origin"
        );
        return StatusCode::FORBIDDEN.into_response();
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let span = tracing::info_span!(
        "subscriber",
        connection_id = %Uuid::new_v4(),
        campaign_id = %campaign_id,
    );
    ws.on_failed_upgrade(|e| tracing::warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| {
            let channel = state.channels.get_or_create(&campaign_id);
            session::run(socket, channel, state.shutdown_rx.clone()).instrument(span)
        })
}

/// Browser origin check.
///
/// Allowed: no `Origin` header, an origin on the request's own host, or an
/// origin host matching a configured pattern.
fn origin_allowed(headers: &HeaderMap, policy: &SubscriberConfig) -> bool {
    let Some(origin) = headers.get(header::ORIGIN) else {
        return true;
    };
    let Some(origin_host) = origin
        .to_str()
        .ok()
        .and_then(|origin| Url::parse(origin).ok())
        .and_then(|url| {
            let host = url.host_str()?;
            Some(match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            })
        })
    else {
        return false;
    };

    let same_host = headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .is_some_and(|host| host.eq_ignore_ascii_case(&origin_host));

    same_host || policy.allows_origin_host(&origin_host)
}
