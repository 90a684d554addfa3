// File I/O: the on-disk storage backend and JSON import/export

pub mod error;
pub mod json;
pub mod sqlite;

pub use error::IoError;
pub use sqlite::SqliteStorage;

/// Schema version written to the `meta` table.
/// Increment when the `kv` layout changes in a way old versions can't read.
pub const STORAGE_FORMAT_VERSION: u32 = 1;
