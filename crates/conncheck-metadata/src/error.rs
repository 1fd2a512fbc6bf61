//! Error types for metadata loading.

use thiserror::Error;

/// Result type alias for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors that can occur while loading directory metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read directory file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse directory: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate peer id: {0}")]
    DuplicatePeer(String),
}
