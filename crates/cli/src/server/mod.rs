//! UDP and TCP listeners feeding queries to the [`DnsServerHandler`].

mod tcp;
mod udp;

use kvdns_infrastructure::DnsServerHandler;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Serves DNS on `bind_addr` until `shutdown` fires. UDP runs one
/// SO_REUSEPORT socket per available core; TCP is a single listener.
pub async fn start_dns_server(
    bind_addr: String,
    handler: DnsServerHandler,
    tcp_enabled: bool,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr.parse()?;
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let handler = Arc::new(handler);
    let mut tasks = JoinSet::new();

    for id in 0..workers {
        let worker = udp::UdpWorker::bind(id, addr, handler.clone())?;
        tasks.spawn(worker.run(shutdown.clone()));
    }

    if tcp_enabled {
        let listener = tcp::bind(addr)?;
        tasks.spawn(tcp::serve(listener, (*handler).clone(), shutdown.clone()));
    }

    info!(address = %addr, udp_workers = workers, tcp_enabled, "DNS server ready");

    while tasks.join_next().await.is_some() {}
    info!("DNS server stopped");
    Ok(())
}

/// Socket with address reuse, accepting IPv4-mapped peers on IPv6 binds.
fn reusable_socket(addr: SocketAddr, kind: Type, protocol: Protocol) -> std::io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, kind, Some(protocol))?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    Ok(socket)
}
