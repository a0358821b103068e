//! Adapters for kvdns: the Consul KV client and settings watcher, the
//! upstream forwarder used as next handler, and the DNS wire host.
pub mod dns;
pub mod kv;

pub use dns::{DnsServerHandler, UpstreamForwarder};
pub use kv::{ConfigWatcher, ConsulKvStore};
