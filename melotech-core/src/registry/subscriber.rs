//! Transport side of a streaming connection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

/// Errors raised by a streaming transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer or its writer task is gone.
    #[error("connection closed")]
    Closed,

    /// The transport did not accept the write in time.
    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    /// The upgrade handshake did not complete.
    #[error("handshake failed: {0}")]
    Handshake(String),
}

/// Something a text message can be pushed to.
///
/// A failed send means the connection is unusable; the registry prunes it.
#[async_trait]
pub trait Subscriber: Send + Sync + 'static {
    async fn send_text(&self, text: Arc<str>) -> Result<(), TransportError>;
}

/// Subscriber backed by a bounded channel drained by a socket writer task.
///
/// A send suspends while the channel is full, up to `timeout`.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    tx: mpsc::Sender<Arc<str>>,
    timeout: Duration,
}

/// Buffer of each connection's outgoing queue.
pub const DEFAULT_OUTBOX_BUFFER: usize = 64;

impl ChannelSubscriber {
    /// Create a subscriber and the receiver its writer task drains.
    pub fn channel(buffer: usize, timeout: Duration) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx, timeout }, rx)
    }
}

#[async_trait]
impl Subscriber for ChannelSubscriber {
    async fn send_text(&self, text: Arc<str>) -> Result<(), TransportError> {
        self.tx
            .send_timeout(text, self.timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => TransportError::Timeout(self.timeout),
                SendTimeoutError::Closed(_) => TransportError::Closed,
            })
    }
}
