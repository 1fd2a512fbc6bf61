//! Eligibility — whether a peer is a valid check target right now.
//!
//! A peer is only checked when its host is active, its container is
//! running, and the local companion container is itself running. The
//! last condition keeps an unhealthy node from judging its peers.

use conncheck_metadata::{Container, Host};
use thiserror::Error;

/// Reason a peer was skipped this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Ineligible {
    #[error("host metadata not available")]
    MissingHost,

    #[error("peer container metadata not available")]
    MissingContainer,

    #[error("companion container metadata not available")]
    MissingCompanion,

    #[error("host state is {0:?}, not active")]
    HostNotActive(String),

    #[error("host agent state is {0:?}, not active")]
    AgentNotActive(String),

    #[error("companion container state is {0:?}, not running")]
    CompanionNotRunning(String),

    #[error("peer container state is {0:?}, not running")]
    ContainerNotRunning(String),
}

/// Decide whether a peer may be checked given the current snapshots.
pub fn evaluate(
    host: Option<&Host>,
    container: Option<&Container>,
    companion: Option<&Container>,
) -> Result<(), Ineligible> {
    let host = host.ok_or(Ineligible::MissingHost)?;
    let container = container.ok_or(Ineligible::MissingContainer)?;
    let companion = companion.ok_or(Ineligible::MissingCompanion)?;

    if !host.is_active() {
        return Err(Ineligible::HostNotActive(host.state.clone()));
    }
    if !host.agent_is_active() {
        return Err(Ineligible::AgentNotActive(host.agent_state.clone()));
    }
    if !companion.is_running() {
        return Err(Ineligible::CompanionNotRunning(companion.state.clone()));
    }
    if !container.is_running() {
        return Err(Ineligible::ContainerNotRunning(container.state.clone()));
    }

    Ok(())
}
