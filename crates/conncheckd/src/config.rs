//! conncheck.toml configuration parser.

use std::path::Path;

use conncheck_health::MonitorConfig;
use conncheck_metadata::Directory;
use serde::{Deserialize, Serialize};

/// Daemon configuration: monitor settings plus the static directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(flatten)]
    pub directory: Directory,
}

impl DaemonConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: DaemonConfig = toml::from_str(content)?;
        if config.monitor.check_interval_ms == 0 {
            anyhow::bail!("monitor.check_interval_ms must be greater than zero");
        }
        config.directory.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full() {
        let toml_str = r#"
[monitor]
check_interval_ms = 2000
probe_timeout_ms = 500

[companion]
primary_ip = "10.42.1.2"
state = "running"

[[peers]]
id = "peer-a"
host = { agent_ip = "10.0.0.11", state = "active" }
container = { primary_ip = "10.42.1.7", state = "running" }
"#;
        let config = DaemonConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.monitor.check_interval_ms, 2000);
        assert_eq!(config.monitor.probe_timeout_ms, 500);
        assert_eq!(config.monitor.ping_path, "/ping");
        assert!(config.directory.companion.is_some());
        assert_eq!(config.directory.peers.len(), 1);
        assert_eq!(config.directory.peers[0].id, "peer-a");
    }

    #[test]
    fn parse_minimal_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").unwrap();
        assert_eq!(config.monitor, MonitorConfig::default());
        assert!(config.directory.peers.is_empty());
    }

    #[test]
    fn zero_interval_rejected() {
        let toml_str = r#"
[monitor]
check_interval_ms = 0
"#;
        assert!(DaemonConfig::from_toml_str(toml_str).is_err());
    }

    #[test]
    fn duplicate_peers_rejected() {
        let toml_str = r#"
[[peers]]
id = "a"

[[peers]]
id = "a"
"#;
        let err = DaemonConfig::from_toml_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("duplicate peer id"));
    }

    #[test]
    fn example_config_parses() {
        let content = include_str!("../conncheck.example.toml");
        let config = DaemonConfig::from_toml_str(content).unwrap();
        assert!(!config.directory.peers.is_empty());
    }
}
