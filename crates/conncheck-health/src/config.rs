//! Monitor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by every peer monitor of a service.
///
/// Immutable once a monitor is constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Base period between checks, before jitter is subtracted.
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    /// Per-probe network timeout.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// HTTP path pinged on the peer container.
    #[serde(default = "default_ping_path")]
    pub ping_path: String,
    /// Body the peer must answer with.
    #[serde(default = "default_expected_body")]
    pub expected_body: String,
}

fn default_check_interval_ms() -> u64 {
    5000
}

fn default_probe_timeout_ms() -> u64 {
    2000
}

fn default_ping_path() -> String {
    "/ping".to_string()
}

fn default_expected_body() -> String {
    "pong".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            ping_path: default_ping_path(),
            expected_body: default_expected_body(),
        }
    }
}

impl MonitorConfig {
    /// Config with the given interval and timeout and default ping settings.
    pub fn new(check_interval_ms: u64, probe_timeout_ms: u64) -> Self {
        Self {
            check_interval_ms,
            probe_timeout_ms,
            ..Default::default()
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// URL pinged for a container at `primary_ip`.
    pub fn ping_url(&self, primary_ip: &str) -> String {
        format!("http://{primary_ip}{}", self.ping_path)
    }
}
