//! Key/value persistence behind the document.
//!
//! Every slice of document state (zones, sheet fields, customizations, tabs,
//! history, theme) lives under its own key as a JSON string. Backends only
//! move strings around; typing happens in [`crate::state`].

use std::collections::HashMap;

use crate::error::StorageError;

/// Storage keys, one per independently persisted slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Zones,
    Sheet,
    ZoneCustomizations,
    History,
    Tabs,
    ActiveTheme,
    CustomThemes,
}

impl StorageKey {
    pub const ALL: [StorageKey; 7] = [
        StorageKey::Zones,
        StorageKey::Sheet,
        StorageKey::ZoneCustomizations,
        StorageKey::History,
        StorageKey::Tabs,
        StorageKey::ActiveTheme,
        StorageKey::CustomThemes,
    ];

    /// The key string as written to the backend
    pub const fn as_str(self) -> &'static str {
        match self {
            StorageKey::Zones => "customZones",
            StorageKey::Sheet => "ficheAnalyse",
            StorageKey::ZoneCustomizations => "zoneCustomizations",
            StorageKey::History => "ficheHistoryStack",
            StorageKey::Tabs => "ficheAnalyseTabs",
            StorageKey::ActiveTheme => "activeTheme",
            StorageKey::CustomThemes => "customThemes",
        }
    }
}

/// A string key/value backend.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage. Survives nothing; used by tests and as the
/// default backend when no database is configured.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new();
        assert!(storage.get("customZones").unwrap().is_none());

        storage.set("customZones", "[]".into()).unwrap();
        assert_eq!(storage.get("customZones").unwrap().as_deref(), Some("[]"));
        assert_eq!(storage.len(), 1);

        storage.remove("customZones").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_key_strings_are_distinct() {
        let mut names: Vec<_> = StorageKey::ALL.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), StorageKey::ALL.len());
    }
}
