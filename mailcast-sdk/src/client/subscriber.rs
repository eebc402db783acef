//! Campaign status stream client (`GET /subscribe/{campaign_id}`).

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use super::ClientError;
use crate::objects::ws::SubscriberEvent;

/// A live subscription to one campaign.
///
/// Yields the server's replay first, then live events. Once the server
/// closes the stream, [`next_event`](Subscription::next_event) returns
/// `Ok(None)` and [`close_code`](Subscription::close_code) reports why.
pub struct Subscription {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    close_code: Option<u16>,
}

impl Subscription {
    /// Connect to `{base_url}/subscribe/{campaign_id}`.
    ///
    /// `http`/`https` base URLs are mapped to `ws`/`wss`.
    pub async fn connect(base_url: &Url, campaign_id: &str) -> Result<Self, ClientError> {
        let url = subscribe_url(base_url, campaign_id)?;
        let (stream, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;
        Ok(Self {
            stream,
            close_code: None,
        })
    }

    /// Wait for the next status frame.
    pub async fn next_event(&mut self) -> Result<Option<SubscriberEvent>, ClientError> {
        while let Some(message) = self.stream.next().await {
            match message? {
                Message::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
                Message::Close(frame) => {
                    self.close_code = frame.map(|f| u16::from(f.code));
                    return Ok(None);
                }
                // Pings are answered by tungstenite itself.
                _ => continue,
            }
        }
        Ok(None)
    }

    /// Close code received from the server, if the stream has ended.
    pub fn close_code(&self) -> Option<u16> {
        self.close_code
    }

    /// Send a normal close frame.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.close(None).await?;
        // Drain until the server acknowledges.
        while let Some(Ok(_)) = self.stream.next().await {}
        Ok(())
    }

    /// Send a text frame. The server ignores application data, this only
    /// exists to exercise that path.
    pub async fn send_text(&mut self, text: &str) -> Result<(), ClientError> {
        self.stream.send(Message::Text(text.to_owned())).await?;
        Ok(())
    }
}

/// Build the WebSocket URL for a campaign stream.
pub(crate) fn subscribe_url(base_url: &Url, campaign_id: &str) -> Result<Url, ClientError> {
    let mut url = base_url.join(&format!(
        "/subscribe/{}",
        urlencoding::encode(campaign_id)
    ))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(ClientError::UnsupportedScheme(other.to_owned())),
    };
    url.set_scheme(scheme)
        .map_err(|()| ClientError::UnsupportedScheme(scheme.to_owned()))?;
    Ok(url)
}
