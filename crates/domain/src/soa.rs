use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_SOA_REFRESH: u32 = 3600;
pub const DEFAULT_SOA_RETRY: u32 = 600;
pub const DEFAULT_SOA_EXPIRE: u32 = 86400;
pub const DEFAULT_SOA_MINIMUM: u32 = 3600;

static PROCESS_SERIAL: OnceLock<u32> = OnceLock::new();

/// Serial used for synthesized SOA records. Taken from the wall clock the first
/// time it is read and constant for the rest of the process lifetime.
pub fn process_serial() -> u32 {
    *PROCESS_SERIAL.get_or_init(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(1)
    })
}

/// Start of Authority data, either stored in the zone apex document or synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SoaData {
    pub mname: String,

    pub rname: String,

    #[serde(default = "process_serial")]
    pub serial: u32,

    #[serde(default = "default_refresh")]
    pub refresh: u32,

    #[serde(default = "default_retry")]
    pub retry: u32,

    #[serde(default = "default_expire")]
    pub expire: u32,

    #[serde(default = "default_minimum")]
    pub minimum: u32,
}

impl SoaData {
    /// Defaults served for zones whose apex document carries no SOA entry.
    pub fn synthesized(zone: &str) -> Self {
        Self {
            mname: format!("ns.{}", zone),
            rname: format!("hostmaster.{}", zone),
            serial: process_serial(),
            refresh: DEFAULT_SOA_REFRESH,
            retry: DEFAULT_SOA_RETRY,
            expire: DEFAULT_SOA_EXPIRE,
            minimum: DEFAULT_SOA_MINIMUM,
        }
    }

    /// Responsible mailbox in domain-name form (`admin@example.com` becomes
    /// `admin.example.com`).
    pub fn mailbox(&self) -> String {
        self.rname.replacen('@', ".", 1)
    }
}

fn default_refresh() -> u32 {
    DEFAULT_SOA_REFRESH
}

fn default_retry() -> u32 {
    DEFAULT_SOA_RETRY
}

fn default_expire() -> u32 {
    DEFAULT_SOA_EXPIRE
}

fn default_minimum() -> u32 {
    DEFAULT_SOA_MINIMUM
}
