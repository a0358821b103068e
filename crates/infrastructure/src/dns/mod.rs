pub mod forwarding;
pub mod server;
pub mod transport;
pub mod wire;

pub use forwarding::UpstreamForwarder;
pub use server::DnsServerHandler;
