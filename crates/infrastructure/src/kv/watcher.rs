use kvdns_application::ports::KvWatch;
use kvdns_application::ApplyZoneSettingsUseCase;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const DEFAULT_WAIT: Duration = Duration::from_secs(300);
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-polls the settings document and applies every change after the first
/// observation. The value present at startup is applied by the caller, so the
/// first read only establishes the index.
pub struct ConfigWatcher {
    kv: Arc<dyn KvWatch>,
    key: String,
    apply: Arc<ApplyZoneSettingsUseCase>,
    wait: Duration,
    retry_delay: Duration,
    shutdown: CancellationToken,
}

impl ConfigWatcher {
    pub fn new(
        kv: Arc<dyn KvWatch>,
        key: impl Into<String>,
        apply: Arc<ApplyZoneSettingsUseCase>,
    ) -> Self {
        Self {
            kv,
            key: key.into(),
            apply,
            wait: DEFAULT_WAIT,
            retry_delay: DEFAULT_RETRY_DELAY,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(key = %self.key, "Started watching settings key");
        tokio::spawn(async move { self.run().await })
    }

    async fn run(&self) {
        let mut index = 0u64;
        let mut primed = false;

        loop {
            let result = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!(key = %self.key, "ConfigWatcher: shutting down");
                    break;
                }
                result = self.kv.watch(&self.key, index, self.wait) => result,
            };

            let event = match result {
                Ok(event) => event,
                Err(e) => {
                    warn!(key = %self.key, error = %e, "Error watching settings key");
                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.retry_delay) => continue,
                    }
                }
            };

            // any index movement counts, including a reset to a lower index
            let changed = event.index != index;
            index = event.index;

            if !primed {
                primed = true;
                continue;
            }
            if !changed {
                continue;
            }

            match event.value {
                Some(document) => {
                    if self.apply.execute(&document).is_ok() {
                        info!(key = %self.key, index, "Applied settings from KV store");
                    }
                }
                None => debug!(key = %self.key, "Settings key removed, keeping current settings"),
            }
        }
    }
}
