use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use super::errors::ConfigError;

/// Resolvers used as the next handler for names outside the configured zones.
/// An empty list means there is no next handler.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub servers: Vec<String>,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl UpstreamConfig {
    /// Parses `servers`, appending port 53 to bare addresses.
    pub fn socket_addrs(&self) -> Result<Vec<SocketAddr>, ConfigError> {
        self.servers
            .iter()
            .map(|server| parse_server(server))
            .collect()
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            timeout: default_timeout(),
        }
    }
}

fn parse_server(server: &str) -> Result<SocketAddr, ConfigError> {
    let server = server.trim_start_matches("udp://");

    if let Ok(addr) = server.parse::<SocketAddr>() {
        return Ok(addr);
    }

    server
        .parse::<std::net::IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .map_err(|_| ConfigError::Validation(format!("Invalid upstream server '{}'", server)))
}

fn default_timeout() -> u64 {
    2000
}
