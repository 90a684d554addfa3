use thiserror::Error;

/// Errors raised by the persisted key/value layer.
///
/// Not-found ids are never errors in this crate; operations on a missing
/// zone, tab or field simply do nothing.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend failed to read or write (disk, database, ...).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be parsed.
    #[error("malformed value under '{key}': {source}")]
    Malformed {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("failed to serialize '{key}': {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}
