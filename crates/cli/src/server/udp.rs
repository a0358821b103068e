use super::reusable_socket;
use kvdns_infrastructure::DnsServerHandler;
use socket2::{Protocol, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const SOCKET_BUFFER_SIZE: usize = 512 * 1024;

/// One receive loop over its own SO_REUSEPORT socket. Each datagram is
/// answered on its own task.
pub struct UdpWorker {
    id: usize,
    socket: Arc<UdpSocket>,
    handler: Arc<DnsServerHandler>,
}

impl UdpWorker {
    pub fn bind(
        id: usize,
        addr: SocketAddr,
        handler: Arc<DnsServerHandler>,
    ) -> anyhow::Result<Self> {
        let socket = reusable_socket(addr, Type::DGRAM, Protocol::UDP)?;
        #[cfg(unix)]
        socket.set_reuse_port(true)?;
        socket.set_recv_buffer_size(SOCKET_BUFFER_SIZE)?;
        socket.set_send_buffer_size(SOCKET_BUFFER_SIZE)?;
        socket.bind(&addr.into())?;
        socket.set_nonblocking(true)?;

        let socket = UdpSocket::from_std(socket.into())?;
        Ok(Self {
            id,
            socket: Arc::new(socket),
            handler,
        })
    }

    pub async fn run(self, shutdown: CancellationToken) {
        let mut buf = [0u8; 4096];

        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = self.socket.recv_from(&mut buf) => received,
            };

            match received {
                Ok((len, peer)) => self.respond(Arc::from(&buf[..len]), peer),
                Err(e) => debug!(worker = self.id, error = %e, "UDP recv error"),
            }
        }

        debug!(worker = self.id, "UDP worker stopped");
    }

    fn respond(&self, query: Arc<[u8]>, peer: SocketAddr) {
        let handler = self.handler.clone();
        let socket = self.socket.clone();

        tokio::spawn(async move {
            let Some(reply) = handler.handle_raw(&query).await else {
                return;
            };
            if let Err(e) = socket.send_to(&reply, peer).await {
                debug!(client = %peer, error = %e, "UDP send error");
            }
        });
    }
}
