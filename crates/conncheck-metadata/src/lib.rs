//! conncheck-metadata — the metadata view consumed by peer monitors.
//!
//! Host and container descriptors are owned and refreshed by a directory
//! client. Monitors only ever read the latest snapshot they were handed:
//!
//! ```text
//! directory client ── Publisher<T> ──watch──▶ Snapshot<T> ── PeerMonitor
//! ```
//!
//! The static [`Directory`] loaded from TOML is the directory client used
//! by `conncheckd`.

pub mod directory;
pub mod error;
pub mod snapshot;
pub mod types;

pub use directory::{Directory, DirectoryPublishers, DirectoryUpdate, PeerRecord, PeerSnapshots};
pub use error::{MetadataError, MetadataResult};
pub use snapshot::{Publisher, Snapshot, snapshot};
pub use types::*;
