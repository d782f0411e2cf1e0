//! Room-scoped registry of live streaming connections.
//!
//! The registry owns every [`Subscriber`] from the moment [`connect`]
//! succeeds until the connection is removed by [`disconnect`], by a failed
//! send, or by [`close_all`] at shutdown.
//!
//! Room membership and the connection index live behind one lock, so every
//! connection is always a member of exactly one room and indexed exactly
//! once. Broadcasts send to a snapshot taken under a read lock and prune
//! failed members afterwards, so a slow peer never blocks connects or
//! disconnects.
//!
//! [`connect`]: ConnectionRegistry::connect
//! [`disconnect`]: ConnectionRegistry::disconnect
//! [`close_all`]: ConnectionRegistry::close_all

mod room;
mod subscriber;

pub use room::{ConnectionId, Room};
pub use subscriber::{ChannelSubscriber, DEFAULT_OUTBOX_BUFFER, Subscriber, TransportError};

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Public view of a registered connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub room: Room,
    pub subscriber_id: Option<String>,
    pub connected_at: OffsetDateTime,
}

struct ConnectionRecord {
    info: ConnectionInfo,
    sink: Arc<dyn Subscriber>,
}

#[derive(Default)]
struct RegistryState {
    /// Room -> member ids.
    rooms: HashMap<Room, HashSet<ConnectionId>>,
    /// Member id -> record.
    connections: HashMap<ConnectionId, ConnectionRecord>,
}

impl RegistryState {
    fn insert(&mut self, record: ConnectionRecord) {
        let id = record.info.id;
        self.rooms
            .entry(record.info.room.clone())
            .or_default()
            .insert(id);
        self.connections.insert(id, record);
    }

    fn remove(&mut self, id: ConnectionId) -> Option<ConnectionRecord> {
        let record = self.connections.remove(&id)?;
        if let Some(members) = self.rooms.get_mut(&record.info.room) {
            members.remove(&id);
            if members.is_empty() {
                self.rooms.remove(&record.info.room);
            }
        }
        Some(record)
    }
}

/// Outcome of one [`ConnectionRegistry::broadcast`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub pruned: usize,
}

/// Tracks live connections grouped into rooms.
#[derive(Default)]
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete `handshake` and register the resulting subscriber in `room`.
    ///
    /// Nothing is registered when the handshake fails.
    pub async fn connect<F, S>(
        &self,
        handshake: F,
        room: Room,
        subscriber_id: Option<String>,
    ) -> Result<ConnectionInfo, TransportError>
    where
        F: Future<Output = Result<S, TransportError>>,
        S: Subscriber,
    {
        let sink = handshake.await?;
        Ok(self.register(Arc::new(sink), room, subscriber_id).await)
    }

    /// Register an already-open subscriber.
    pub async fn register(
        &self,
        sink: Arc<dyn Subscriber>,
        room: Room,
        subscriber_id: Option<String>,
    ) -> ConnectionInfo {
        let info = ConnectionInfo {
            id: ConnectionId::generate(),
            room,
            subscriber_id,
            connected_at: OffsetDateTime::now_utc(),
        };
        self.state.write().await.insert(ConnectionRecord {
            info: info.clone(),
            sink,
        });
        info!(connection_id = %info.id, room = %info.room, "Connection registered");
        info
    }

    /// Remove a connection. Returns `false` if it was already gone.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.state.write().await.remove(id);
        match removed {
            Some(record) => {
                info!(connection_id = %id, room = %record.info.room, "Connection removed");
                true
            }
            None => false,
        }
    }

    /// Send `message` to every current member of `room`.
    ///
    /// Members whose send fails are removed once all sends have finished;
    /// one failure never stops delivery to the others.
    pub async fn broadcast(&self, room: &Room, message: &str) -> BroadcastReport {
        let members: Vec<(ConnectionId, Arc<dyn Subscriber>)> = {
            let state = self.state.read().await;
            let Some(ids) = state.rooms.get(room) else {
                debug!(room = %room, "Broadcast to empty room");
                return BroadcastReport::default();
            };
            ids.iter()
                .filter_map(|id| {
                    state
                        .connections
                        .get(id)
                        .map(|record| (*id, Arc::clone(&record.sink)))
                })
                .collect()
        };

        let text: Arc<str> = Arc::from(message);
        let results = join_all(members.iter().map(|(id, sink)| {
            let text = Arc::clone(&text);
            async move { (*id, sink.send_text(text).await) }
        }))
        .await;

        let mut report = BroadcastReport::default();
        let mut failed = Vec::new();
        for (id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(connection_id = %id, room = %room, error = %e, "Broadcast send failed, pruning");
                    failed.push(id);
                }
            }
        }

        for id in failed {
            if self.disconnect(id).await {
                report.pruned += 1;
            }
        }

        debug!(
            room = %room,
            delivered = report.delivered,
            pruned = report.pruned,
            "Broadcast complete"
        );
        report
    }

    /// Send `message` to a single connection, removing it if the send fails.
    pub async fn send_to(&self, id: ConnectionId, message: &str) -> Result<(), TransportError> {
        let sink = {
            let state = self.state.read().await;
            match state.connections.get(&id) {
                Some(record) => Arc::clone(&record.sink),
                None => return Err(TransportError::Closed),
            }
        };

        if let Err(e) = sink.send_text(Arc::from(message)).await {
            warn!(connection_id = %id, error = %e, "Direct send failed, pruning");
            self.disconnect(id).await;
            return Err(e);
        }
        Ok(())
    }

    /// Live connections in `room`, or across all rooms when `None`.
    pub async fn connection_count(&self, room: Option<&Room>) -> usize {
        let state = self.state.read().await;
        match room {
            Some(room) => state.rooms.get(room).map_or(0, HashSet::len),
            None => state.connections.len(),
        }
    }

    /// Rooms that currently have members.
    pub async fn list_rooms(&self) -> Vec<Room> {
        self.state.read().await.rooms.keys().cloned().collect()
    }

    /// Drop every connection and clear all rooms. Returns how many were open.
    ///
    /// Dropping a subscriber ends its writer, which closes the socket.
    pub async fn close_all(&self) -> usize {
        let drained = std::mem::take(&mut *self.state.write().await);
        let count = drained.connections.len();
        info!(connections = count, "Connection registry cleared");
        count
    }
}
