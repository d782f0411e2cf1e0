//! Health / introspection document.

use serde::{Deserialize, Serialize};

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub features: Vec<String>,
    /// Live connections across all rooms.
    pub active_connections: usize,
    /// Rooms with at least one live connection.
    pub active_rooms: Vec<String>,
}
