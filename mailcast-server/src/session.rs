//! One WebSocket subscriber connection.
//!
//! A session registers a [`SubscriberSink`] on its campaign channel, writes
//! the replay snapshot, then forwards live events until the peer leaves, the
//! channel evicts it, or the server shuts down. The sink is unregistered on
//! every exit path.

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use mailcast_core::broadcast::{ChannelState, Evict, SinkId, SinkReceiver, SubscriberSink};
use mailcast_core::events::NormalizedEvent;
use mailcast_sdk::objects::ws::{SLOW_CONSUMER_REASON, WsCloseCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Deadline for any single outbound frame.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

const SHUTDOWN_REASON: &str = "server shutting down";

type WsWriter = SplitSink<WebSocket, Message>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("write timed out after {WRITE_TIMEOUT:?}")]
    WriteTimeout,

    #[error("websocket error: {0}")]
    Transport(#[from] axum::Error),

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// How a session ended without a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// The peer sent a close frame, with its code if any.
    PeerClosed(Option<u16>),
    /// The read side failed or hit end of stream without a close frame.
    PeerDropped,
    /// The channel found the queue full.
    Evicted,
    Shutdown,
    /// A replay write failed; the rest of the snapshot was skipped.
    ReplayAborted,
}

/// Eviction capability handed to the channel: wakes the session, which
/// closes the socket with a policy-violation frame.
struct EvictSignal(watch::Sender<bool>);

impl Evict for EvictSignal {
    fn evict(&self) {
        self.0.send_replace(true);
    }
}

/// Unsubscribes the sink when the session scope ends.
struct Registration {
    channel: Arc<ChannelState>,
    sink: SinkId,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.channel.unsubscribe(self.sink);
        debug!(sink = %self.sink, "Subscriber unregistered");
    }
}

/// Drive an upgraded connection until it ends.
pub async fn run(
    socket: WebSocket,
    channel: Arc<ChannelState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let (evict_tx, mut evicted) = watch::channel(false);
    let (sink, mut queue) = SubscriberSink::new(EvictSignal(evict_tx));
    let replay = channel.subscribe(&sink);
    let _registration = Registration {
        channel,
        sink: sink.id(),
    };
    info!(sink = %sink.id(), replay = replay.len(), "Subscriber connected");

    let (mut writer, reader) = socket.split();
    let read_pump = read_pump(reader);
    tokio::pin!(read_pump);

    let outcome = tokio::select! {
        biased;
        _ = evicted.changed() => Ok(SessionEnd::Evicted),
        _ = wait_for_shutdown(&mut shutdown_rx) => Ok(SessionEnd::Shutdown),
        end = &mut read_pump => Ok(end),
        result = forward(&mut writer, replay, &mut queue) => result,
    };

    match outcome {
        Ok(SessionEnd::Evicted) => {
            warn!("Evicting slow subscriber");
            close_with(&mut writer, WsCloseCode::POLICY_VIOLATION, SLOW_CONSUMER_REASON).await;
        }
        Ok(SessionEnd::Shutdown) => {
            debug!("Closing subscriber for shutdown");
            close_with(&mut writer, WsCloseCode::GOING_AWAY, SHUTDOWN_REASON).await;
        }
        Ok(SessionEnd::PeerClosed(code)) => {
            if is_abnormal_close(code) {
                error!(?code, "Subscriber closed abnormally");
            } else {
                info!(?code, "Subscriber disconnected");
            }
            // Flushes the close acknowledgement.
            let _ = tokio::time::timeout(WRITE_TIMEOUT, writer.close()).await;
        }
        Ok(SessionEnd::PeerDropped) => info!("Subscriber connection dropped"),
        Ok(SessionEnd::ReplayAborted) => debug!("Replay aborted, closing session"),
        Err(e) => error!(error = %e, "Subscriber session failed"),
    }
}

/// Any peer close other than normal closure or going-away.
fn is_abnormal_close(code: Option<u16>) -> bool {
    !matches!(
        code,
        None | Some(WsCloseCode::NORMAL) | Some(WsCloseCode::GOING_AWAY)
    )
}

/// Write the replay snapshot, then every queued event.
async fn forward(
    writer: &mut WsWriter,
    replay: Vec<Arc<NormalizedEvent>>,
    queue: &mut SinkReceiver,
) -> Result<SessionEnd, SessionError> {
    for event in replay {
        if let Err(e) = send_event(writer, &event).await {
            debug!(error = %e, "Replay write failed");
            return Ok(SessionEnd::ReplayAborted);
        }
    }

    // The session holds the sink, so the queue outlives this loop.
    while let Some(event) = queue.recv().await {
        send_event(writer, &event).await?;
    }
    Ok(SessionEnd::PeerDropped)
}

async fn send_event(writer: &mut WsWriter, event: &NormalizedEvent) -> Result<(), SessionError> {
    let frame = serde_json::to_string(&event.to_wire())?;
    tokio::time::timeout(WRITE_TIMEOUT, writer.send(Message::Text(frame.into())))
        .await
        .map_err(|_| SessionError::WriteTimeout)??;
    Ok(())
}

/// Drain inbound frames until the peer goes away. Application data is
/// ignored; control frames are answered by the transport.
async fn read_pump(mut reader: SplitStream<WebSocket>) -> SessionEnd {
    while let Some(message) = reader.next().await {
        match message {
            Ok(Message::Close(frame)) => return SessionEnd::PeerClosed(frame.map(|f| f.code)),
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "Subscriber read failed");
                return SessionEnd::PeerDropped;
            }
        }
    }
    SessionEnd::PeerDropped
}

/// Resolve once shutdown is requested. Never resolves if the signal source
/// is gone.
async fn wait_for_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    let signalled = shutdown_rx.wait_for(|&stop| stop).await.is_ok();
    if !signalled {
        std::future::pending::<()>().await;
    }
}

async fn close_with(writer: &mut WsWriter, code: u16, reason: &'static str) {
    let frame = Message::Close(Some(CloseFrame {
        code,
        reason: Utf8Bytes::from_static(reason),
    }));
    match tokio::time::timeout(WRITE_TIMEOUT, writer.send(frame)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(error = %e, "Failed to send close frame"),
        Err(_) => debug!("Timed out sending close frame"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abnormal_close_codes() {
        assert!(!is_abnormal_close(None));
        assert!(!is_abnormal_close(Some(WsCloseCode::NORMAL)));
        assert!(!is_abnormal_close(Some(WsCloseCode::GOING_AWAY)));
        assert!(is_abnormal_close(Some(WsCloseCode::POLICY_VIOLATION)));
        assert!(is_abnormal_close(Some(1011)));
    }
}
