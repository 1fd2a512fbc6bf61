//! Descriptor types for hosts and containers.
//!
//! States are kept as the raw strings reported by the directory so that
//! unknown states pass through untouched and simply fail eligibility.

use serde::{Deserialize, Serialize};

/// Host state meaning the host is usable.
pub const HOST_STATE_ACTIVE: &str = "active";

/// Container state meaning the container is up.
pub const CONTAINER_STATE_RUNNING: &str = "running";

/// Host descriptor as reported by the directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Host {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    /// Address of the host agent (e.g., "10.42.0.5").
    pub agent_ip: String,
    pub state: String,
    /// Agent state; empty when the directory does not report one.
    #[serde(default)]
    pub agent_state: String,
}

impl Host {
    /// Whether the host itself is `active`.
    pub fn is_active(&self) -> bool {
        self.state == HOST_STATE_ACTIVE
    }

    /// Whether the agent state is empty or `active`.
    pub fn agent_is_active(&self) -> bool {
        self.agent_state.is_empty() || self.agent_state == HOST_STATE_ACTIVE
    }
}

/// Container descriptor as reported by the directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Container {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    /// Primary network address of the container.
    pub primary_ip: String,
    pub state: String,
}

impl Container {
    /// Whether the container is `running`.
    pub fn is_running(&self) -> bool {
        self.state == CONTAINER_STATE_RUNNING
    }
}
