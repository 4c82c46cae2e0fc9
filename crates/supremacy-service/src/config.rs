//! Service configuration.

use std::path::PathBuf;
use std::time::Duration;

use supremacy_protocol::GameOptions;
use supremacy_transport::DEFAULT_PORT;

/// Configuration for a host service instance.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// Interval between heartbeat pings to every connected client.
    pub heartbeat_interval: Duration,

    /// Missed pings tolerated before a client is considered dead.
    pub max_missed_pings: u32,

    /// How long a fresh connection may take to send its handshake
    /// request before being dropped.
    pub handshake_timeout: Duration,

    /// Directory save-game snapshots are written to and loaded from.
    pub save_dir: PathBuf,

    /// Initial game options; the host player may change them in the lobby.
    pub options: GameOptions,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("127.0.0.1:{DEFAULT_PORT}"),
            heartbeat_interval: Duration::from_secs(15),
            max_missed_pings: 3,
            handshake_timeout: Duration::from_secs(10),
            save_dir: PathBuf::from("saves"),
            options: GameOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_uses_well_known_port() {
        let config = ServiceConfig::default();
        assert!(config.bind_addr.ends_with(":4455"));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(15));
        assert_eq!(config.max_missed_pings, 3);
    }
}
