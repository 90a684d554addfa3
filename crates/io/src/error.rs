use thiserror::Error;

use fiche_engine::StorageError;

/// Errors from file import/export and the SQLite backend.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no data directory available on this platform")]
    NoDataDir,
}

impl From<IoError> for StorageError {
    fn from(err: IoError) -> Self {
        StorageError::backend(err)
    }
}
