//! Linear undo/redo ledger.
//!
//! Every semantic mutation of the document is recorded as a [`HistoryAction`]
//! carrying a typed [`Change`]. Undo and redo replay the change straight into
//! the persisted slices through a [`ReplayTarget`], never through the
//! document's logging setters, and the ledger ignores `record` calls while a
//! replay is in progress.

use std::collections::BTreeMap;

use chrono::Utc;
use fiche_config::settings::DEFAULT_HISTORY_LIMIT;
use fiche_config::theme::ThemeSnapshot;
use fiche_core::{Position, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::customization::{ZoneCustomization, ZoneCustomizations};
use crate::error::StorageError;
use crate::sheet::{ReadingSheet, SheetValue};
use crate::tabs::Tab;
use crate::zone::Zone;

/// Action kinds, as shown in the history panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Create,
    Delete,
    Move,
    Resize,
    Content,
    Rename,
    Color,
    Restore,
    Theme,
    Customization,
}

impl ActionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionType::Create => "create",
            ActionType::Delete => "delete",
            ActionType::Move => "move",
            ActionType::Resize => "resize",
            ActionType::Content => "content",
            ActionType::Rename => "rename",
            ActionType::Color => "color",
            ActionType::Restore => "restore",
            ActionType::Theme => "theme",
            ActionType::Customization => "customization",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    Zone,
    SheetField,
    Tab,
    Theme,
}

/// The entity an action touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "type")]
    pub kind: TargetKind,
    /// Zone id, sheet field name, tab id, or the fixed theme label
    pub id: String,
}

impl Target {
    pub fn new(kind: TargetKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }
}

/// Before/after payload of one action. Each variant carries exactly the
/// sub-fields needed to invert or re-apply it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Change {
    /// Zone as it was created
    Create { zone: Zone },
    /// Full zone record before the soft-delete
    Delete { before: Zone },
    Restore { zone_id: String },
    Move { zone_id: String, before: Position, after: Position },
    Resize { zone_id: String, before: Size, after: Size },
    ZoneContent { zone_id: String, before: String, after: String },
    ZoneRename { zone_id: String, before: String, after: String },
    SheetField { field: String, before: SheetValue, after: SheetValue },
    TabRename { tab_id: String, before: String, after: String },
    /// Background color of a fixed-layout zone
    Color { zone_id: String, before: Option<String>, after: Option<String> },
    /// Whole customization record of a fixed-layout zone; `None` means no override
    Customization {
        zone_id: String,
        before: Option<ZoneCustomization>,
        after: Option<ZoneCustomization>,
    },
    Theme { before: ThemeSnapshot, after: ThemeSnapshot },
}

impl Change {
    pub fn action_type(&self) -> ActionType {
        match self {
            Change::Create { .. } => ActionType::Create,
            Change::Delete { .. } => ActionType::Delete,
            Change::Restore { .. } => ActionType::Restore,
            Change::Move { .. } => ActionType::Move,
            Change::Resize { .. } => ActionType::Resize,
            Change::ZoneContent { .. } | Change::SheetField { .. } => ActionType::Content,
            Change::ZoneRename { .. } | Change::TabRename { .. } => ActionType::Rename,
            Change::Color { .. } => ActionType::Color,
            Change::Customization { .. } => ActionType::Customization,
            Change::Theme { .. } => ActionType::Theme,
        }
    }

    pub fn target(&self) -> Target {
        match self {
            Change::Create { zone } => Target::new(TargetKind::Zone, zone.id.clone()),
            Change::Delete { before } => Target::new(TargetKind::Zone, before.id.clone()),
            Change::Restore { zone_id }
            | Change::Move { zone_id, .. }
            | Change::Resize { zone_id, .. }
            | Change::ZoneContent { zone_id, .. }
            | Change::ZoneRename { zone_id, .. }
            | Change::Color { zone_id, .. }
            | Change::Customization { zone_id, .. } => Target::new(TargetKind::Zone, zone_id.clone()),
            Change::SheetField { field, .. } => Target::new(TargetKind::SheetField, field.clone()),
            Change::TabRename { tab_id, .. } => Target::new(TargetKind::Tab, tab_id.clone()),
            Change::Theme { .. } => Target::new(TargetKind::Theme, "active"),
        }
    }

    fn replay<T: ReplayTarget + ?Sized>(&self, target: &mut T, direction: Direction) -> Result<(), StorageError> {
        match self {
            Change::Create { zone } => with_zones(target, |zones| match direction {
                Direction::Undo => {
                    let before = zones.len();
                    zones.retain(|z| z.id != zone.id);
                    if zones.len() == before {
                        log::debug!("undo create: zone {} already gone", zone.id);
                    }
                }
                Direction::Redo => upsert_zone(zones, zone.clone()),
            }),
            Change::Delete { before } => with_zones(target, |zones| match direction {
                Direction::Undo => upsert_zone(zones, before.clone()),
                Direction::Redo => edit_zone(zones, &before.id, Zone::mark_deleted),
            }),
            Change::Restore { zone_id } => with_zones(target, |zones| match direction {
                Direction::Undo => edit_zone(zones, zone_id, Zone::mark_deleted),
                Direction::Redo => edit_zone(zones, zone_id, Zone::mark_restored),
            }),
            Change::Move { zone_id, before, after } => {
                let position = *direction.pick(before, after);
                with_zones(target, |zones| edit_zone(zones, zone_id, |z| z.position = position))
            }
            Change::Resize { zone_id, before, after } => {
                let size = *direction.pick(before, after);
                with_zones(target, |zones| edit_zone(zones, zone_id, |z| z.size = size))
            }
            Change::ZoneContent { zone_id, before, after } => {
                let content = direction.pick(before, after);
                with_zones(target, |zones| edit_zone(zones, zone_id, |z| z.content = content.clone()))
            }
            Change::ZoneRename { zone_id, before, after } => {
                let title = direction.pick(before, after);
                with_zones(target, |zones| edit_zone(zones, zone_id, |z| z.title = title.clone()))
            }
            Change::SheetField { field, before, after } => {
                let mut sheet = target.load_sheet()?;
                if !sheet.set_value(field, direction.pick(before, after).clone()) {
                    log::warn!("sheet field {field}: recorded value has the wrong shape, skipped");
                }
                target.store_sheet_without_logging(&sheet)
            }
            Change::TabRename { tab_id, before, after } => {
                let mut tabs = target.load_tabs()?;
                match tabs.iter_mut().find(|t| &t.id == tab_id) {
                    Some(tab) => tab.title = direction.pick(before, after).clone(),
                    None => log::debug!("replay rename: tab {tab_id} not found"),
                }
                target.store_tabs_without_logging(&tabs)
            }
            Change::Color { zone_id, before, after } => {
                let mut customizations = target.load_customizations()?;
                customizations.set_background(zone_id, direction.pick(before, after).clone());
                target.store_customizations_without_logging(&customizations)
            }
            Change::Customization { zone_id, before, after } => {
                let mut customizations = target.load_customizations()?;
                customizations.put(zone_id, direction.pick(before, after).clone());
                target.store_customizations_without_logging(&customizations)
            }
            Change::Theme { before, after } => target.restore_theme(direction.pick(before, after)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Undo,
    Redo,
}

impl Direction {
    fn pick<'a, T>(self, before: &'a T, after: &'a T) -> &'a T {
        match self {
            Direction::Undo => before,
            Direction::Redo => after,
        }
    }
}

fn with_zones<T, F>(target: &mut T, f: F) -> Result<(), StorageError>
where
    T: ReplayTarget + ?Sized,
    F: FnOnce(&mut Vec<Zone>),
{
    let mut zones = target.load_zones()?;
    f(&mut zones);
    target.store_zones_without_logging(&zones)
}

/// Replace the zone with the same id in place, or append it
fn upsert_zone(zones: &mut Vec<Zone>, zone: Zone) {
    match zones.iter_mut().find(|z| z.id == zone.id) {
        Some(existing) => *existing = zone,
        None => zones.push(zone),
    }
}

fn edit_zone(zones: &mut [Zone], zone_id: &str, edit: impl FnOnce(&mut Zone)) {
    match zones.iter_mut().find(|z| z.id == zone_id) {
        Some(zone) => {
            edit(zone);
            zone.touch();
        }
        None => log::debug!("replay: zone {zone_id} not found"),
    }
}

/// Persisted slices a replay writes into.
///
/// Loads are strict: a malformed slice is an error and aborts the replay. A
/// missing slice reads as its default. The `*_without_logging` writers must
/// never feed back into the history ledger.
pub trait ReplayTarget {
    fn load_zones(&self) -> Result<Vec<Zone>, StorageError>;
    fn store_zones_without_logging(&mut self, zones: &[Zone]) -> Result<(), StorageError>;

    fn load_sheet(&self) -> Result<ReadingSheet, StorageError>;
    fn store_sheet_without_logging(&mut self, sheet: &ReadingSheet) -> Result<(), StorageError>;

    fn load_customizations(&self) -> Result<ZoneCustomizations, StorageError>;
    fn store_customizations_without_logging(&mut self, customizations: &ZoneCustomizations) -> Result<(), StorageError>;

    fn load_tabs(&self) -> Result<Vec<Tab>, StorageError>;
    fn store_tabs_without_logging(&mut self, tabs: &[Tab]) -> Result<(), StorageError>;

    /// Hand a theme snapshot to the theme collaborator
    fn restore_theme(&mut self, snapshot: &ThemeSnapshot) -> Result<(), StorageError>;
}

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryAction {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Display label, never used for replay
    pub description: String,
    pub target: Target,
    pub change: Change,
}

/// Derived view for the history panel.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub total_actions: usize,
    pub current_index: Option<usize>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub action_types: BTreeMap<ActionType, usize>,
}

/// Persisted form of the ledger: `{history, currentIndex}` with -1 for empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub history: Vec<HistoryAction>,
    pub current_index: i64,
}

impl Default for LedgerSnapshot {
    fn default() -> Self {
        Self { history: Vec::new(), current_index: -1 }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryLedger {
    history: Vec<HistoryAction>,
    /// Last applied entry; `None` when nothing is applied
    current_index: Option<usize>,
    max_entries: usize,
    /// Set while undo/redo writes into the target
    replaying: bool,
    last_timestamp: i64,
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryLedger {
    pub fn new(max_entries: usize) -> Self {
        Self {
            history: Vec::new(),
            current_index: None,
            max_entries: max_entries.max(1),
            replaying: false,
            last_timestamp: 0,
        }
    }

    /// Rebuild from the persisted form. An out-of-range index is clamped.
    pub fn from_snapshot(snapshot: LedgerSnapshot, max_entries: usize) -> Self {
        let mut ledger = Self::new(max_entries);
        let len = snapshot.history.len() as i64;
        let index = snapshot.current_index.clamp(-1, len - 1);
        if index != snapshot.current_index {
            log::warn!("history index {} out of range for {} entries, clamped", snapshot.current_index, len);
        }
        ledger.last_timestamp = snapshot.history.iter().map(|a| a.timestamp).max().unwrap_or(0);
        ledger.history = snapshot.history;
        ledger.current_index = usize::try_from(index).ok();
        ledger.enforce_cap();
        ledger
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            history: self.history.clone(),
            current_index: self.current_index.map_or(-1, |i| i as i64),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = max_entries.max(1);
        self.enforce_cap();
    }

    /// Append an action, discarding any undone entries first.
    ///
    /// Returns false without recording anything while a replay is running.
    pub fn record(&mut self, change: Change, description: impl Into<String>) -> bool {
        if self.replaying {
            log::debug!("replay in progress, not recording {}", change.action_type().as_str());
            return false;
        }

        let keep = self.current_index.map_or(0, |i| i + 1);
        self.history.truncate(keep);

        let timestamp = Utc::now().timestamp_millis().max(self.last_timestamp);
        self.last_timestamp = timestamp;
        let action = HistoryAction {
            id: new_action_id(timestamp),
            action_type: change.action_type(),
            timestamp,
            description: description.into(),
            target: change.target(),
            change,
        };
        log::debug!("history: {} ({})", action.description, action.action_type.as_str());

        self.history.push(action);
        self.current_index = Some(self.history.len() - 1);
        self.enforce_cap();
        true
    }

    fn enforce_cap(&mut self) {
        if self.history.len() <= self.max_entries {
            return;
        }
        let excess = self.history.len() - self.max_entries;
        self.history.drain(..excess);
        self.current_index = self.current_index.and_then(|i| i.checked_sub(excess));
    }

    pub fn can_undo(&self) -> bool {
        self.current_index.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.next_index().is_some()
    }

    fn next_index(&self) -> Option<usize> {
        let next = self.current_index.map_or(0, |i| i + 1);
        (next < self.history.len()).then_some(next)
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    /// Apply the inverse of the current action. The index only moves when
    /// the replay succeeded.
    pub fn undo<T: ReplayTarget + ?Sized>(&mut self, target: &mut T) -> bool {
        let Some(index) = self.current_index else {
            return false;
        };
        if !self.replay(index, target, Direction::Undo) {
            return false;
        }
        self.current_index = index.checked_sub(1);
        true
    }

    /// Re-apply the next undone action.
    pub fn redo<T: ReplayTarget + ?Sized>(&mut self, target: &mut T) -> bool {
        let Some(index) = self.next_index() else {
            return false;
        };
        if !self.replay(index, target, Direction::Redo) {
            return false;
        }
        self.current_index = Some(index);
        true
    }

    fn replay<T: ReplayTarget + ?Sized>(&mut self, index: usize, target: &mut T, direction: Direction) -> bool {
        let action = &self.history[index];
        self.replaying = true;
        let result = action.change.replay(target, direction);
        self.replaying = false;

        match result {
            Ok(()) => {
                log::debug!("{:?}: {}", direction, action.description);
                true
            }
            Err(e) => {
                log::error!("{:?} of '{}' failed: {}", direction, action.description, e);
                false
            }
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.current_index = None;
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn entries(&self) -> &[HistoryAction] {
        &self.history
    }

    /// True if the entry at `index` is currently applied
    pub fn is_applied(&self, index: usize) -> bool {
        self.current_index.is_some_and(|i| index <= i)
    }

    pub fn summary(&self) -> HistorySummary {
        let mut action_types = BTreeMap::new();
        for action in &self.history {
            *action_types.entry(action.action_type).or_insert(0) += 1;
        }
        HistorySummary {
            total_actions: self.history.len(),
            current_index: self.current_index,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            action_types,
        }
    }
}

fn new_action_id(timestamp: i64) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("action-{timestamp}-{suffix}")
}
