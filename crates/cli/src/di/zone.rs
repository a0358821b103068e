use kvdns_application::ports::{Handler, KvStore};
use kvdns_application::{shared_settings, ApplyZoneSettingsUseCase, EngineMetrics, ZoneEngine};
use kvdns_domain::{Config, KvCacheOptions};
use kvdns_infrastructure::{ConfigWatcher, ConsulKvStore, UpstreamForwarder};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct ZoneServices {
    pub engine: Arc<ZoneEngine>,
    pub watcher: Option<JoinHandle<()>>,
}

impl ZoneServices {
    pub async fn new(config: &Config, shutdown: CancellationToken) -> anyhow::Result<Self> {
        info!(address = %config.kv.address, prefix = %config.kv.prefix, "Initializing Consul KV store");

        let kv = Arc::new(ConsulKvStore::new(&config.kv)?);
        let settings = shared_settings(config.zone.clone());
        let metrics = EngineMetrics::new();
        let apply = Arc::new(ApplyZoneSettingsUseCase::new(
            settings.clone(),
            metrics.clone(),
        ));

        Self::load_initial_settings(kv.as_ref(), &apply, &config.kv.config_key()).await;

        let mut engine = ZoneEngine::new(kv.clone(), settings).with_metrics(metrics);

        let forwarder = UpstreamForwarder::from_config(&config.upstream)?;
        if forwarder.is_empty() {
            info!("No upstream servers configured, out-of-zone queries will fail");
        } else {
            info!(servers = config.upstream.servers.len(), "Upstream forwarding enabled");
            let next: Arc<dyn Handler> = Arc::new(forwarder);
            engine = engine.with_next(next);
        }

        let engine = Arc::new(engine);
        if !engine.ready().await {
            warn!(address = %kv.address(), "Consul is not reachable yet, serving will retry per query");
        }

        let watcher = if config.kv.disable_watch {
            info!("Settings watch disabled");
            None
        } else {
            let watcher = ConfigWatcher::new(kv, config.kv.config_key(), apply)
                .with_wait(Duration::from_secs(config.kv.watch_wait))
                .with_cancellation(shutdown);
            Some(Arc::new(watcher).start())
        };

        let settings = engine.settings();
        info!(
            zones = ?settings.zones,
            zone_prefix = %settings.prefix,
            flattening = ?settings.flattening,
            fallthrough = settings.fallthrough,
            "Zone engine ready"
        );

        Ok(Self { engine, watcher })
    }

    /// Applies the `<prefix>/config` document once at startup. A missing or
    /// unreadable document leaves the file settings in place.
    async fn load_initial_settings(
        kv: &dyn KvStore,
        apply: &ApplyZoneSettingsUseCase,
        key: &str,
    ) {
        match kv.get(key, &KvCacheOptions::default()).await {
            Ok(Some(document)) => match apply.execute(&document) {
                Ok(_) => info!(key = %key, "Applied settings document from KV store"),
                Err(e) => warn!(key = %key, error = %e, "Ignoring invalid settings document"),
            },
            Ok(None) => info!(key = %key, "No settings document in KV store, using file settings"),
            Err(e) => warn!(key = %key, error = %e, "Unable to read settings document"),
        }
    }
}
