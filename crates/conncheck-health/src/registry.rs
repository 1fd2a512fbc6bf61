//! Peer registry — owns the monitors for every peer of a service.
//!
//! All monitors share one `MonitorConfig`, one probe and the local
//! companion snapshot. Each still runs as its own task, so a slow peer
//! never delays another.

use std::collections::HashMap;
use std::sync::Arc;

use conncheck_metadata::{Container, Host, Snapshot};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::peer::PeerMonitor;
use crate::probe::ReachabilityProbe;

/// Reachability of one monitored peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerStatus {
    pub id: String,
    pub reachable: bool,
}

/// Manages peer monitors keyed by peer id.
pub struct PeerRegistry {
    config: MonitorConfig,
    probe: Arc<dyn ReachabilityProbe>,
    companion: Snapshot<Container>,
    monitors: RwLock<HashMap<String, Arc<PeerMonitor>>>,
}

impl PeerRegistry {
    pub fn new(
        config: MonitorConfig,
        probe: Arc<dyn ReachabilityProbe>,
        companion: Snapshot<Container>,
    ) -> Self {
        Self {
            config,
            probe,
            companion,
            monitors: RwLock::new(HashMap::new()),
        }
    }

    /// Start monitoring a peer.
    ///
    /// A monitor already running for `id` is shut down and replaced.
    pub async fn start_peer(
        &self,
        id: &str,
        host: Snapshot<Host>,
        container: Snapshot<Container>,
    ) -> MonitorResult<Arc<PeerMonitor>> {
        let monitor = Arc::new(PeerMonitor::new(
            id,
            self.config.clone(),
            host,
            container,
            self.companion.clone(),
            self.probe.clone(),
        ));
        monitor.start()?;

        let mut monitors = self.monitors.write().await;
        if let Some(old) = monitors.insert(id.to_string(), monitor.clone()) {
            old.shutdown()?;
            debug!(peer = %id, "replaced existing peer monitor");
        }

        info!(peer = %id, "peer monitor started");
        Ok(monitor)
    }

    /// Stop monitoring a peer.
    ///
    /// Returns the stopped monitor so the caller can wait for its task.
    pub async fn stop_peer(&self, id: &str) -> MonitorResult<Arc<PeerMonitor>> {
        let mut monitors = self.monitors.write().await;
        let monitor = monitors
            .remove(id)
            .ok_or_else(|| MonitorError::UnknownPeer(id.to_string()))?;
        monitor.shutdown()?;
        info!(peer = %id, "peer monitor stopped");
        Ok(monitor)
    }

    /// Stop every monitor (for graceful shutdown).
    pub async fn stop_all(&self) -> Vec<Arc<PeerMonitor>> {
        let mut monitors = self.monitors.write().await;
        let mut stopped = Vec::with_capacity(monitors.len());
        for (id, monitor) in monitors.drain() {
            if let Err(e) = monitor.shutdown() {
                debug!(peer = %id, error = %e, "peer monitor shutdown failed");
            }
            stopped.push(monitor);
        }
        info!(count = stopped.len(), "all peer monitors stopped");
        stopped
    }

    /// Look up the monitor for a peer.
    pub async fn get(&self, id: &str) -> Option<Arc<PeerMonitor>> {
        self.monitors.read().await.get(id).cloned()
    }

    /// Ids of all monitored peers, sorted.
    pub async fn active_peers(&self) -> Vec<String> {
        let monitors = self.monitors.read().await;
        let mut ids: Vec<String> = monitors.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Check if a peer has an active monitor.
    pub async fn is_monitoring(&self, id: &str) -> bool {
        self.monitors.read().await.contains_key(id)
    }

    /// Debounced reachability of a peer, or `None` if it is not monitored.
    pub async fn is_reachable(&self, id: &str) -> Option<bool> {
        self.monitors.read().await.get(id).map(|m| m.is_reachable())
    }

    /// Reachability of every monitored peer, sorted by id.
    pub async fn statuses(&self) -> Vec<PeerStatus> {
        let monitors = self.monitors.read().await;
        let mut statuses: Vec<PeerStatus> = monitors
            .iter()
            .map(|(id, m)| PeerStatus {
                id: id.clone(),
                reachable: m.is_reachable(),
            })
            .collect();
        statuses.sort_by(|a, b| a.id.cmp(&b.id));
        statuses
    }
}
