mod dns_handler;
mod kv_store;

pub use dns_handler::{
    Handler, ResponseCapture, ResponseWriter, ServeError, ZoneQuery, ZoneResponse,
};
pub use kv_store::{KvStore, KvWatch, KvWatchEvent};
