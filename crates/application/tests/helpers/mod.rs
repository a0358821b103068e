#![allow(dead_code)]

mod mock_handlers;
mod mock_kv_store;

pub use mock_handlers::ScriptedHandler;
pub use mock_kv_store::MockKvStore;
