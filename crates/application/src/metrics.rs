use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

type ZoneTypeKey = (String, String);
type FailureKey = (String, String, &'static str);

/// KV request outcome labels.
pub const KV_STATUS_OK: &str = "NOERROR";
pub const KV_STATUS_NOT_FOUND: &str = "NODATA";
pub const KV_STATUS_ERROR: &str = "ERROR";

/// Config update outcome labels.
pub const CONFIG_STATUS_OK: &str = "NOERROR";
pub const CONFIG_STATUS_ERROR: &str = "ERROR";

#[derive(Default)]
struct LatencyCounter {
    count: AtomicU64,
    total_us: AtomicU64,
}

/// Counters for the zone engine and its collaborators. Cloning shares the
/// underlying counters.
#[derive(Clone, Default)]
pub struct EngineMetrics {
    requests: Arc<DashMap<ZoneTypeKey, u64>>,

    successful: Arc<DashMap<ZoneTypeKey, u64>>,

    failed: Arc<DashMap<FailureKey, u64>>,

    kv_requests: Arc<DashMap<&'static str, Arc<LatencyCounter>>>,

    config_updates: Arc<DashMap<&'static str, u64>>,

    plugin_errors: Arc<DashMap<&'static str, u64>>,

    total_requests: Arc<AtomicU64>,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, zone: &str, query_type: &str) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        bump(&self.requests, (zone.to_string(), query_type.to_string()));
    }

    pub fn record_success(&self, zone: &str, query_type: &str) {
        bump(&self.successful, (zone.to_string(), query_type.to_string()));
    }

    pub fn record_failure(&self, zone: &str, query_type: &str, error: &'static str) {
        bump(
            &self.failed,
            (zone.to_string(), query_type.to_string(), error),
        );
    }

    pub fn record_kv_request(&self, status: &'static str, elapsed: Duration) {
        let counter = self
            .kv_requests
            .entry(status)
            .or_insert_with(|| Arc::new(LatencyCounter::default()))
            .clone();
        counter.count.fetch_add(1, Ordering::Relaxed);
        counter
            .total_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_config_update(&self, status: &'static str) {
        bump(&self.config_updates, status);
    }

    pub fn record_plugin_error(&self, kind: &'static str) {
        bump(&self.plugin_errors, kind);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn requests(&self, zone: &str, query_type: &str) -> u64 {
        self.requests
            .get(&(zone.to_string(), query_type.to_string()))
            .map(|v| *v)
            .unwrap_or(0)
    }

    pub fn successful(&self, zone: &str, query_type: &str) -> u64 {
        self.successful
            .get(&(zone.to_string(), query_type.to_string()))
            .map(|v| *v)
            .unwrap_or(0)
    }

    pub fn failed(&self, zone: &str, query_type: &str, error: &'static str) -> u64 {
        self.failed
            .get(&(zone.to_string(), query_type.to_string(), error))
            .map(|v| *v)
            .unwrap_or(0)
    }

    pub fn kv_requests(&self, status: &'static str) -> u64 {
        self.kv_requests
            .get(status)
            .map(|c| c.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn avg_kv_latency_us(&self, status: &'static str) -> f64 {
        self.kv_requests
            .get(status)
            .map(|c| {
                let count = c.count.load(Ordering::Relaxed);
                if count == 0 {
                    0.0
                } else {
                    c.total_us.load(Ordering::Relaxed) as f64 / count as f64
                }
            })
            .unwrap_or(0.0)
    }

    pub fn config_updates(&self, status: &'static str) -> u64 {
        self.config_updates.get(status).map(|v| *v).unwrap_or(0)
    }

    pub fn plugin_errors(&self, kind: &'static str) -> u64 {
        self.plugin_errors.get(kind).map(|v| *v).unwrap_or(0)
    }

    /// Point-in-time copy of every counter, sorted by label.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot {
            requests: collect(&self.requests, |(zone, qtype)| format!("{zone}/{qtype}")),
            successful: collect(&self.successful, |(zone, qtype)| format!("{zone}/{qtype}")),
            failed: collect(&self.failed, |(zone, qtype, error)| {
                format!("{zone}/{qtype}/{error}")
            }),
            kv_requests: self
                .kv_requests
                .iter()
                .map(|e| (e.key().to_string(), e.value().count.load(Ordering::Relaxed)))
                .collect(),
            config_updates: collect(&self.config_updates, |status| status.to_string()),
            plugin_errors: collect(&self.plugin_errors, |kind| kind.to_string()),
        };
        snapshot.kv_requests.sort();
        snapshot
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests: Vec<(String, u64)>,
    pub successful: Vec<(String, u64)>,
    pub failed: Vec<(String, u64)>,
    pub kv_requests: Vec<(String, u64)>,
    pub config_updates: Vec<(String, u64)>,
    pub plugin_errors: Vec<(String, u64)>,
}

fn bump<K: std::hash::Hash + Eq>(map: &DashMap<K, u64>, key: K) {
    map.entry(key).and_modify(|c| *c += 1).or_insert(1);
}

fn collect<K, F>(map: &DashMap<K, u64>, label: F) -> Vec<(String, u64)>
where
    K: std::hash::Hash + Eq,
    F: Fn(&K) -> String,
{
    let mut entries: Vec<_> = map.iter().map(|e| (label(e.key()), *e.value())).collect();
    entries.sort();
    entries
}
