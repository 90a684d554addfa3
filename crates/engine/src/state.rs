//! Persisted state fan-out.
//!
//! Owns the key/value backend and the event bus. Writers mark the state
//! dirty; [`PersistedState::notify`] then bumps the revision and broadcasts a
//! single [`StoreEvent::StorageChanged`], however many keys were written.

use fiche_config::theme::ThemeSnapshot;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::customization::ZoneCustomizations;
use crate::error::StorageError;
use crate::events::{EventBus, EventCallback, StoreEvent, SubscriptionId};
use crate::history::ReplayTarget;
use crate::sheet::ReadingSheet;
use crate::storage::{KeyValueStorage, MemoryStorage, StorageKey};
use crate::tabs::{default_tabs, Tab};
use crate::zone::Zone;

pub struct PersistedState {
    storage: Box<dyn KeyValueStorage>,
    bus: EventBus,
    revision: u64,
    dirty: bool,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }
}

impl PersistedState {
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            bus: EventBus::new(),
            revision: 0,
            dirty: false,
        }
    }

    pub fn into_storage(self) -> Box<dyn KeyValueStorage> {
        self.storage
    }

    /// Bumped once per notified mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Strict read: `Ok(None)` if the key is absent, an error if it is malformed.
    pub fn read<T: DeserializeOwned>(&self, key: StorageKey) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.storage.get(key.as_str())? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Malformed { key: key.as_str(), source })
    }

    /// Lenient read for startup: anything unreadable becomes the default.
    pub fn load<T: DeserializeOwned + Default>(&self, key: StorageKey) -> T {
        match self.read(key) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                log::error!("{e}; falling back to defaults");
                T::default()
            }
        }
    }

    /// Write a slice's full serialized value. Does not notify.
    pub fn write<T: Serialize + ?Sized>(&mut self, key: StorageKey, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize { key: key.as_str(), source })?;
        self.storage.set(key.as_str(), raw)?;
        self.dirty = true;
        Ok(())
    }

    pub fn remove(&mut self, key: StorageKey) -> Result<(), StorageError> {
        self.storage.remove(key.as_str())?;
        self.dirty = true;
        Ok(())
    }

    /// Finish a logical mutation: one `StorageChanged` if anything was written.
    pub fn notify(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        self.revision += 1;
        self.bus.emit(&StoreEvent::StorageChanged { revision: self.revision });
    }

    pub fn subscribe(&mut self, callback: EventCallback) -> SubscriptionId {
        self.bus.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }
}

impl std::fmt::Debug for PersistedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedState")
            .field("revision", &self.revision)
            .field("dirty", &self.dirty)
            .field("bus", &self.bus)
            .finish()
    }
}

impl ReplayTarget for PersistedState {
    fn load_zones(&self) -> Result<Vec<Zone>, StorageError> {
        Ok(self.read(StorageKey::Zones)?.unwrap_or_default())
    }

    fn store_zones_without_logging(&mut self, zones: &[Zone]) -> Result<(), StorageError> {
        self.write(StorageKey::Zones, zones)
    }

    fn load_sheet(&self) -> Result<ReadingSheet, StorageError> {
        Ok(self.read(StorageKey::Sheet)?.unwrap_or_default())
    }

    fn store_sheet_without_logging(&mut self, sheet: &ReadingSheet) -> Result<(), StorageError> {
        self.write(StorageKey::Sheet, sheet)
    }

    fn load_customizations(&self) -> Result<ZoneCustomizations, StorageError> {
        Ok(self.read(StorageKey::ZoneCustomizations)?.unwrap_or_default())
    }

    fn store_customizations_without_logging(&mut self, customizations: &ZoneCustomizations) -> Result<(), StorageError> {
        self.write(StorageKey::ZoneCustomizations, customizations)
    }

    fn load_tabs(&self) -> Result<Vec<Tab>, StorageError> {
        Ok(self.read(StorageKey::Tabs)?.unwrap_or_else(default_tabs))
    }

    fn store_tabs_without_logging(&mut self, tabs: &[Tab]) -> Result<(), StorageError> {
        self.write(StorageKey::Tabs, tabs)
    }

    fn restore_theme(&mut self, snapshot: &ThemeSnapshot) -> Result<(), StorageError> {
        self.write(StorageKey::ActiveTheme, snapshot)?;
        self.bus.emit(&StoreEvent::ThemeRestore(snapshot.clone()));
        Ok(())
    }
}
