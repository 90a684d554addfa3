//! The document: every persisted slice behind one facade.
//!
//! Mutations follow the same path: update the in-memory slice, write the
//! slice's key, append to the history ledger, then notify once. Undo/redo
//! write storage directly and the caches are re-read afterwards.
//!
//! Operations are spread over several files by concern:
//! - `zone_ops.rs`: zone store and canvas
//! - `sheet_ops.rs`: sheet fields, fixed-zone customizations, tabs, theme
//! - `undo_redo.rs`: undo/redo and history queries

use fiche_config::settings::Settings;
use fiche_config::theme::ThemeSnapshot;
use fiche_core::Size;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::customization::ZoneCustomizations;
use crate::events::{EventCallback, SubscriptionId};
use crate::history::{Change, HistoryLedger, LedgerSnapshot};
use crate::placement::PlacementPolicy;
use crate::sheet::ReadingSheet;
use crate::state::PersistedState;
use crate::storage::{KeyValueStorage, MemoryStorage, StorageKey};
use crate::tabs::{Tab, TabStore};
use crate::zone::Zone;

/// Canvas size assumed until the host reports the real one
pub const DEFAULT_CANVAS_SIZE: Size = Size::new(1200.0, 800.0);

#[derive(Debug)]
pub struct Document {
    pub(crate) state: PersistedState,

    // Caches of the persisted slices
    pub(crate) zones: Vec<Zone>,
    pub(crate) sheet: ReadingSheet,
    pub(crate) customizations: ZoneCustomizations,
    pub(crate) tabs: TabStore,
    pub(crate) theme: ThemeSnapshot,
    pub(crate) ledger: HistoryLedger,

    // Canvas
    pub(crate) selected_zone: Option<String>,
    pub(crate) drag_mode: bool,
    pub(crate) placement: PlacementPolicy,
    pub(crate) canvas_size: Size,
    pub(crate) show_deleted: bool,

    /// Revision the caches were last synced at
    pub(crate) synced_revision: u64,
    pub(crate) rng: StdRng,
}

impl Document {
    /// Open a document over `storage`. Unreadable slices are logged and
    /// replaced by their defaults.
    pub fn open(storage: Box<dyn KeyValueStorage>, settings: &Settings) -> Self {
        let state = PersistedState::new(storage);
        let default_theme = ThemeSnapshot::builtin(settings.active_theme.clone());

        let mut doc = Self {
            zones: Vec::new(),
            sheet: ReadingSheet::default(),
            customizations: ZoneCustomizations::default(),
            tabs: TabStore::default(),
            theme: default_theme,
            ledger: HistoryLedger::new(settings.history_limit),
            selected_zone: None,
            drag_mode: false,
            placement: PlacementPolicy::from_settings(settings),
            canvas_size: DEFAULT_CANVAS_SIZE,
            show_deleted: settings.show_deleted_zones,
            synced_revision: 0,
            rng: StdRng::from_entropy(),
            state,
        };
        doc.reload();
        doc.ledger = HistoryLedger::from_snapshot(doc.state.load::<LedgerSnapshot>(StorageKey::History), settings.history_limit);
        log::info!(
            "opened document: {} zone(s), {} history entries",
            doc.zones.len(),
            doc.ledger.len()
        );
        doc
    }

    /// Empty document on process-local storage with default settings
    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryStorage::new()), &Settings::default())
    }

    /// Deterministic placement and attachment ids
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Re-read every cached slice from storage.
    ///
    /// Call after a `StorageChanged` notification that this document did not
    /// produce. The history ledger is not re-read: this document owns it.
    pub fn reload(&mut self) {
        self.zones = self.state.load(StorageKey::Zones);
        self.sheet = self.state.load(StorageKey::Sheet);
        self.customizations = self.state.load(StorageKey::ZoneCustomizations);
        self.tabs.replace(self.state.load::<Vec<Tab>>(StorageKey::Tabs));
        if let Some(theme) = self.state.load::<Option<ThemeSnapshot>>(StorageKey::ActiveTheme) {
            self.theme = theme;
        }
        if let Some(id) = self.selected_zone.as_deref() {
            if !self.zones.iter().any(|z| z.id == id) {
                self.selected_zone = None;
            }
        }
        self.synced_revision = self.state.revision();
    }

    /// True if storage moved since the caches were last read
    pub fn is_stale(&self) -> bool {
        self.synced_revision != self.state.revision()
    }

    /// Apply changed settings without reopening
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.placement = PlacementPolicy::from_settings(settings);
        self.show_deleted = settings.show_deleted_zones;
        self.ledger.set_max_entries(settings.history_limit);
    }

    pub fn subscribe(&mut self, callback: EventCallback) -> SubscriptionId {
        self.state.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    pub fn revision(&self) -> u64 {
        self.state.revision()
    }

    /// Drop the caches and hand back the storage backend
    pub fn close(self) -> Box<dyn KeyValueStorage> {
        self.state.into_storage()
    }

    pub(crate) fn persist<T: Serialize + ?Sized>(&mut self, key: StorageKey, value: &T) {
        if let Err(e) = self.state.write(key, value) {
            log::error!("failed to persist {}: {}", key.as_str(), e);
        }
    }

    pub(crate) fn persist_zones(&mut self) {
        if let Err(e) = self.state.write(StorageKey::Zones, &self.zones) {
            log::error!("failed to persist zones: {e}");
        }
    }

    pub(crate) fn persist_history(&mut self) {
        let snapshot = self.ledger.snapshot();
        self.persist(StorageKey::History, &snapshot);
    }

    /// Append to the ledger (storage is already written)
    pub(crate) fn log_change(&mut self, change: Change, description: String) {
        if self.ledger.record(change, description) {
            self.persist_history();
        }
    }

    /// End of a logical mutation
    pub(crate) fn finish(&mut self) {
        self.state.notify();
        self.synced_revision = self.state.revision();
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::ZoneType;
    use fiche_core::Position;

    #[test]
    fn test_open_empty() {
        let doc = Document::in_memory();
        assert!(doc.zones().is_empty());
        assert_eq!(doc.tabs().len(), 8);
        assert_eq!(doc.theme().theme, "purple");
        assert!(!doc.can_undo());
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn test_open_with_malformed_slices() {
        let mut storage = MemoryStorage::new();
        storage.set("customZones", "[{\"id\": 3}]".into()).unwrap();
        storage.set("ficheHistoryStack", "nope".into()).unwrap();
        storage.set("ficheAnalyse", "{\"titre\": \"Germinal\"}".into()).unwrap();

        let doc = Document::open(Box::new(storage), &Settings::default());
        assert!(doc.zones().is_empty());
        assert!(doc.history().is_empty());
        assert_eq!(doc.sheet().field("titre"), "Germinal");
        assert_eq!(doc.sheet().citations.len(), 1);
    }

    #[test]
    fn test_state_survives_reopen() {
        let mut doc = Document::in_memory().with_seed(3);
        let id = doc.create_zone(ZoneType::Notes, Some("Plan".into()), Some(Position::new(40.0, 60.0)));
        doc.set_sheet_field("auteur", "Hugo");

        let reopened = Document::open(doc.close(), &Settings::default());
        assert_eq!(reopened.zone(&id).unwrap().title, "Plan");
        assert_eq!(reopened.sheet().field("auteur"), "Hugo");
        assert_eq!(reopened.history().len(), 2);
        assert!(reopened.can_undo());
    }

    #[test]
    fn test_apply_settings() {
        let mut doc = Document::in_memory();
        let settings = Settings { snap_to_grid: false, history_limit: 2, ..Settings::default() };
        doc.apply_settings(&settings);
        assert!(!doc.placement.snap_to_grid);
        assert_eq!(doc.ledger.max_entries(), 2);
    }
}
