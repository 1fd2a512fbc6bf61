//! Directory sync — keeps the peer registry in step with the directory.

use std::sync::Arc;

use conncheck_health::{MonitorConfig, PeerRegistry, ReachabilityProbe};
use conncheck_metadata::{Directory, DirectoryPublishers};
use tracing::{debug, warn};

/// Publishes directory reads and starts/stops monitors to match.
pub struct DirectorySync {
    publishers: DirectoryPublishers,
    registry: PeerRegistry,
}

impl DirectorySync {
    pub fn new(config: MonitorConfig, probe: Arc<dyn ReachabilityProbe>) -> Self {
        let publishers = DirectoryPublishers::new();
        let registry = PeerRegistry::new(config, probe, publishers.companion());
        Self {
            publishers,
            registry,
        }
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    /// Publish `directory`, then start monitors for new peers and stop
    /// monitors for peers that disappeared.
    pub async fn apply(&mut self, directory: &Directory) {
        let update = self.publishers.apply(directory);

        for id in &update.removed {
            if let Err(e) = self.registry.stop_peer(id).await {
                warn!(peer = %id, error = %e, "failed to stop peer monitor");
            }
        }

        let added = update.added.len();
        for (id, snapshots) in update.added {
            if let Err(e) = self
                .registry
                .start_peer(&id, snapshots.host, snapshots.container)
                .await
            {
                warn!(peer = %id, error = %e, "failed to start peer monitor");
            }
        }

        debug!(
            added,
            removed = update.removed.len(),
            changed = update.changed,
            "directory applied"
        );
    }
}
