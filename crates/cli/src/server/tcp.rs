use super::reusable_socket;
use hickory_server::ServerFuture;
use kvdns_infrastructure::DnsServerHandler;
use socket2::{Protocol, Type};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

const IDLE_TIMEOUT: Duration = Duration::from_secs(10);
const BACKLOG: i32 = 1024;

pub fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = reusable_socket(addr, Type::STREAM, Protocol::TCP)?;
    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;
    socket.set_nonblocking(true)?;
    Ok(TcpListener::from_std(socket.into())?)
}

/// Length-prefixed DNS over TCP, framed by `hickory-server`.
pub async fn serve(listener: TcpListener, handler: DnsServerHandler, shutdown: CancellationToken) {
    let mut server = ServerFuture::new(handler);
    server.register_listener(listener, IDLE_TIMEOUT);

    tokio::select! {
        result = server.block_until_done() => {
            if let Err(e) = result {
                error!(error = %e, "TCP DNS server error");
            }
        }
        _ = shutdown.cancelled() => debug!("TCP DNS server stopping"),
    }
}
