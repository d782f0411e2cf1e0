//! Live update subscriptions over WebSocket.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use super::ClientError;
use crate::objects::WsServerMessage;
use crate::objects::ws::ECHO_PREFIX;

/// Something received on a live update connection.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Update(WsServerMessage),
    /// Reply to text previously sent with [`LiveUpdates::send_text`].
    Echo(String),
}

/// An open subscription to one room.
pub struct LiveUpdates {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl LiveUpdates {
    /// Subscribe to the admin room (`/ws/admin`).
    ///
    /// `base_url` uses the `ws` or `wss` scheme.
    pub async fn admin(base_url: &Url) -> Result<Self, ClientError> {
        Self::connect(base_url.join("/ws/admin")?).await
    }

    /// Subscribe to one artist's room (`/ws/artist/{user_id}`).
    pub async fn artist(base_url: &Url, user_id: &str) -> Result<Self, ClientError> {
        Self::connect(base_url.join(&format!("/ws/artist/{user_id}"))?).await
    }

    async fn connect(url: Url) -> Result<Self, ClientError> {
        let (socket, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        Ok(Self { socket })
    }

    /// Send a text frame; the server echoes it back.
    pub async fn send_text(&mut self, text: &str) -> Result<(), ClientError> {
        self.socket.send(Message::Text(text.to_owned())).await?;
        Ok(())
    }

    /// Wait for the next event. Returns `None` once the server closes.
    pub async fn next_event(&mut self) -> Option<Result<LiveEvent, ClientError>> {
        loop {
            let frame = match self.socket.next().await? {
                Ok(frame) => frame,
                Err(e) => return Some(Err(e.into())),
            };
            match frame {
                Message::Text(text) => {
                    if let Some(echo) = text.strip_prefix(ECHO_PREFIX) {
                        return Some(Ok(LiveEvent::Echo(echo.to_owned())));
                    }
                    return Some(
                        serde_json::from_str(&text)
                            .map(LiveEvent::Update)
                            .map_err(ClientError::Json),
                    );
                }
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    /// Close the connection.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.socket.close(None).await?;
        Ok(())
    }
}
