//! Room and connection identifiers.

use std::fmt;

use uuid::Uuid;

/// A named group of streaming connections.
///
/// Rooms are only grouping keys: a room exists while it has at least one
/// member and disappears with its last one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Room(String);

impl Room {
    pub const ADMIN: &'static str = "admin";
    const ARTIST_PREFIX: &'static str = "artist:";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The room every admin dashboard joins.
    pub fn admin() -> Self {
        Self::new(Self::ADMIN)
    }

    /// The private room of one artist, `artist:<user_id>`.
    pub fn artist(user_id: &str) -> Self {
        Self(format!("{}{user_id}", Self::ARTIST_PREFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Room> for String {
    fn from(room: Room) -> Self {
        room.0
    }
}

/// Opaque handle of one registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
