//! Static directory — metadata for the local companion and its peers.
//!
//! A directory file looks like:
//!
//! ```toml
//! [companion]
//! primary_ip = "10.42.1.2"
//! state = "running"
//!
//! [[peers]]
//! id = "peer-a"
//! host = { agent_ip = "10.0.0.11", state = "active" }
//! container = { primary_ip = "10.42.1.7", state = "running" }
//! ```
//!
//! [`DirectoryPublishers`] turns successive directory reads into snapshot
//! updates, keeping one publisher pair per known peer.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MetadataError, MetadataResult};
use crate::snapshot::{Publisher, Snapshot, snapshot};
use crate::types::{Container, Host};

/// Full view of the service: the local companion plus every peer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Directory {
    /// The local connectivity-check companion container.
    #[serde(default)]
    pub companion: Option<Container>,
    #[serde(default)]
    pub peers: Vec<PeerRecord>,
}

/// A single remote peer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeerRecord {
    pub id: String,
    #[serde(default)]
    pub host: Option<Host>,
    #[serde(default)]
    pub container: Option<Container>,
}

impl Directory {
    /// Load a directory from a TOML file.
    pub fn from_file(path: &Path) -> MetadataResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a directory from TOML text.
    pub fn from_toml_str(content: &str) -> MetadataResult<Self> {
        let directory: Directory = toml::from_str(content)?;
        directory.validate()?;
        Ok(directory)
    }

    /// Reject directories with repeated peer ids.
    pub fn validate(&self) -> MetadataResult<()> {
        let mut seen = HashSet::new();
        for peer in &self.peers {
            if !seen.insert(peer.id.as_str()) {
                return Err(MetadataError::DuplicatePeer(peer.id.clone()));
            }
        }
        Ok(())
    }
}

/// Reader handles for one peer's metadata.
#[derive(Debug, Clone)]
pub struct PeerSnapshots {
    pub host: Snapshot<Host>,
    pub container: Snapshot<Container>,
}

/// Result of applying a directory read.
#[derive(Debug, Default)]
pub struct DirectoryUpdate {
    /// Peers seen for the first time, with their new snapshot handles.
    pub added: Vec<(String, PeerSnapshots)>,
    /// Peers no longer present; their publishers have been dropped.
    pub removed: Vec<String>,
    /// Number of snapshots whose value changed.
    pub changed: usize,
}

struct PeerPublishers {
    host: Publisher<Host>,
    container: Publisher<Container>,
}

/// Write side of the directory.
pub struct DirectoryPublishers {
    companion: Publisher<Container>,
    companion_snapshot: Snapshot<Container>,
    peers: HashMap<String, PeerPublishers>,
}

impl Default for DirectoryPublishers {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryPublishers {
    pub fn new() -> Self {
        let (companion, companion_snapshot) = snapshot();
        Self {
            companion,
            companion_snapshot,
            peers: HashMap::new(),
        }
    }

    /// Reader handle for the local companion container.
    pub fn companion(&self) -> Snapshot<Container> {
        self.companion_snapshot.clone()
    }

    /// Ids of all currently published peers, sorted.
    pub fn peer_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.peers.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Publish the contents of `directory`.
    ///
    /// Known peers get their snapshots refreshed, new peers get fresh
    /// publishers, and peers missing from `directory` are dropped.
    pub fn apply(&mut self, directory: &Directory) -> DirectoryUpdate {
        let mut update = DirectoryUpdate::default();

        if self.companion.publish_if_changed(directory.companion.clone()) {
            update.changed += 1;
        }

        let mut present = HashSet::new();
        for record in &directory.peers {
            present.insert(record.id.clone());
            match self.peers.get(&record.id) {
                Some(publishers) => {
                    if publishers.host.publish_if_changed(record.host.clone()) {
                        update.changed += 1;
                    }
                    if publishers.container.publish_if_changed(record.container.clone()) {
                        update.changed += 1;
                    }
                }
                None => {
                    let (host_pub, host) = snapshot();
                    let (container_pub, container) = snapshot();
                    if let Some(h) = &record.host {
                        host_pub.publish(h.clone());
                    }
                    if let Some(c) = &record.container {
                        container_pub.publish(c.clone());
                    }
                    self.peers.insert(
                        record.id.clone(),
                        PeerPublishers {
                            host: host_pub,
                            container: container_pub,
                        },
                    );
                    debug!(peer = %record.id, "peer added to directory");
                    update
                        .added
                        .push((record.id.clone(), PeerSnapshots { host, container }));
                }
            }
        }

        let removed: Vec<String> = self
            .peers
            .keys()
            .filter(|id| !present.contains(*id))
            .cloned()
            .collect();
        for id in removed {
            self.peers.remove(&id);
            debug!(peer = %id, "peer removed from directory");
            update.removed.push(id);
        }
        update.removed.sort();

        update
    }
}
