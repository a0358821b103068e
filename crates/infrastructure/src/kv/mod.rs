pub mod consul;
pub mod watcher;

pub use consul::ConsulKvStore;
pub use watcher::ConfigWatcher;
