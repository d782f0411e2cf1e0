use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Upper bound for one WebSocket send before the connection is pruned.
    pub send_timeout: Duration,
}
