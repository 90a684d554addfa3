// SQLite key/value backend for the document

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use fiche_engine::storage::KeyValueStorage;
use fiche_engine::StorageError;

use crate::error::IoError;
use crate::STORAGE_FORMAT_VERSION;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const DB_FILE: &str = "fiche.db";

/// Persists every storage key as one row of the `kv` table.
pub struct SqliteStorage {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStorage {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, IoError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let storage = Self::init(conn, Some(path.to_path_buf()))?;
        log::debug!("opened storage at {}", path.display());
        Ok(storage)
    }

    /// Open the per-user database under the platform data directory.
    pub fn open_default() -> Result<Self, IoError> {
        let path = default_path().ok_or(IoError::NoDataDir)?;
        Self::open(&path)
    }

    /// A throwaway database that lives as long as the value.
    pub fn in_memory() -> Result<Self, IoError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, IoError> {
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            params!["format_version", STORAGE_FORMAT_VERSION.to_string()],
        )?;
        Ok(Self { conn, path })
    }

    /// Location on disk, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Stored format version, if the meta row exists.
    pub fn format_version(&self) -> Result<Option<u32>, IoError> {
        let value: Option<String> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = 'format_version'", [], |row| row.get(0))
            .optional()?;
        Ok(value.and_then(|v| v.parse().ok()))
    }

    /// Every key currently stored, sorted.
    pub fn keys(&self) -> Result<Vec<String>, IoError> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn read(&self, key: &str) -> Result<Option<String>, IoError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), IoError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), IoError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage").field("path", &self.path).finish()
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read(key)?)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        Ok(self.write(key, &value)?)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        Ok(self.delete(key)?)
    }
}

/// `<data_dir>/fiche-lecture/fiche.db`
pub fn default_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(fiche_config::APP_DIR).join(DB_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiche_config::settings::Settings;
    use fiche_core::Position;
    use fiche_engine::storage::StorageKey;
    use fiche_engine::zone::ZoneType;
    use fiche_engine::Document;
    use tempfile::tempdir;

    #[test]
    fn test_get_set_remove() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        assert_eq!(storage.get("customZones").unwrap(), None);

        storage.set("customZones", "[]".into()).unwrap();
        storage.set("customZones", "[1]".into()).unwrap();
        assert_eq!(storage.get("customZones").unwrap().as_deref(), Some("[1]"));
        assert_eq!(storage.keys().unwrap(), vec!["customZones".to_string()]);

        storage.remove("customZones").unwrap();
        assert_eq!(storage.get("customZones").unwrap(), None);
        // Removing a missing key is fine
        storage.remove("customZones").unwrap();
    }

    #[test]
    fn test_format_version_written() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert_eq!(storage.format_version().unwrap(), Some(STORAGE_FORMAT_VERSION));
        assert!(storage.path().is_none());
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("fiche.db");
        let storage = SqliteStorage::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(storage.path(), Some(path.as_path()));
    }

    #[test]
    fn test_document_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fiche.db");

        let id = {
            let storage = SqliteStorage::open(&path).unwrap();
            let mut doc = Document::open(Box::new(storage), &Settings::default());
            let id = doc.create_zone(ZoneType::Notes, Some("Plan".into()), Some(Position::new(60.0, 60.0)));
            doc.set_zone_content(&id, "I. Exposition");
            doc.set_sheet_field("auteur", "Flaubert");
            assert!(doc.undo());
            id
        };

        let storage = SqliteStorage::open(&path).unwrap();
        assert!(storage.keys().unwrap().contains(&StorageKey::History.as_str().to_string()));

        let mut doc = Document::open(Box::new(storage), &Settings::default());
        assert_eq!(doc.zone(&id).unwrap().title, "Plan");
        assert_eq!(doc.sheet().field("auteur"), "");
        assert!(doc.can_redo());
        assert!(doc.redo());
        assert_eq!(doc.sheet().field("auteur"), "Flaubert");
        assert_eq!(doc.zone(&id).unwrap().content, "I. Exposition");
    }

    #[test]
    fn test_storage_error_conversion() {
        let err: StorageError = IoError::NoDataDir.into();
        assert!(matches!(err, StorageError::Backend(_)));
    }
}
