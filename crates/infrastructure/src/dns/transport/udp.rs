//! UDP exchange with an upstream server (RFC 1035 §4.2.1). One socket per
//! query, bound to an ephemeral port.

use kvdns_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Sends `message_bytes` and waits for one datagram from the server. The
    /// timeout covers the whole exchange.
    pub async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, DomainError> {
        tokio::time::timeout(timeout, self.exchange(message_bytes))
            .await
            .map_err(|_| DomainError::QueryTimeout)?
    }

    async fn exchange(&self, message_bytes: &[u8]) -> Result<Vec<u8>, DomainError> {
        let bind_addr: SocketAddr = if self.server_addr.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };

        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| {
            DomainError::NextHandlerFailed(format!("Failed to bind UDP socket: {}", e))
        })?;

        socket.connect(self.server_addr).await.map_err(|e| {
            DomainError::NextHandlerFailed(format!(
                "Failed to connect to {}: {}",
                self.server_addr, e
            ))
        })?;

        let bytes_sent = socket.send(message_bytes).await.map_err(|e| {
            DomainError::NextHandlerFailed(format!(
                "Failed to send UDP query to {}: {}",
                self.server_addr, e
            ))
        })?;
        debug!(server = %self.server_addr, bytes_sent, "UDP query sent");

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        loop {
            let bytes_received = socket.recv(&mut recv_buf).await.map_err(|e| {
                DomainError::NextHandlerFailed(format!(
                    "Failed to receive UDP response from {}: {}",
                    self.server_addr, e
                ))
            })?;

            // a reply must at least echo the query ID
            if bytes_received < 2 || recv_buf.get(..2) != message_bytes.get(..2) {
                warn!(server = %self.server_addr, "Discarding UDP response with mismatched ID");
                continue;
            }

            recv_buf.truncate(bytes_received);
            debug!(server = %self.server_addr, bytes_received, "UDP response received");
            return Ok(recv_buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unanswered_query_times_out() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let transport = UdpTransport::new(silent.local_addr().unwrap());

        let result = transport
            .send(&[0x12, 0x34, 0x01, 0x00], Duration::from_millis(50))
            .await;

        assert_eq!(result.unwrap_err(), DomainError::QueryTimeout);
    }
}
