#![allow(dead_code)]

mod consul_mock;
mod dns_server_mock;
mod kv_mocks;

pub use consul_mock::MockConsulServer;
pub use dns_server_mock::{MockDnsServer, MockUpstreamBehavior};
pub use kv_mocks::{MemoryKvStore, ScriptedKvWatch};
