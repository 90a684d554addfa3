//! Sheet fields, fixed-zone customizations, tabs and theme on [`Document`].

use std::collections::BTreeMap;

use chrono::Utc;
use fiche_config::theme::ThemeSnapshot;

use crate::customization::{CustomizationUpdate, ZoneCustomization};
use crate::document::Document;
use crate::history::Change;
use crate::sheet::{CitationPart, ReadingSheet, SheetValue, CITATIONS_FIELD};
use crate::storage::StorageKey;
use crate::tabs::{Tab, DEFAULT_TAB_ICON};

pub const RESET_TABS_PROMPT: &str = "Réinitialiser les onglets ? Les onglets ajoutés seront supprimés.";

impl Document {
    // Reading sheet

    pub fn sheet(&self) -> &ReadingSheet {
        &self.sheet
    }

    /// Edit a text field. Logged as `content` on the field.
    pub fn set_sheet_field(&mut self, field: &str, value: impl Into<String>) {
        let before = self.sheet.value(field);
        let after = SheetValue::Text(value.into());
        self.apply_sheet_value(field, before, after);
    }

    pub fn update_citation(&mut self, index: usize, part: CitationPart, value: impl Into<String>) {
        let before = self.sheet.value(CITATIONS_FIELD);
        if !self.sheet.update_citation(index, part, value) {
            return;
        }
        self.commit_citations(before, "Modification d'une citation");
    }

    pub fn add_citation(&mut self) {
        let before = self.sheet.value(CITATIONS_FIELD);
        self.sheet.add_citation();
        self.commit_citations(before, "Ajout d'une citation");
    }

    pub fn remove_citation(&mut self, index: usize) {
        let before = self.sheet.value(CITATIONS_FIELD);
        if !self.sheet.remove_citation(index) {
            return;
        }
        self.commit_citations(before, "Suppression d'une citation");
    }

    fn apply_sheet_value(&mut self, field: &str, before: SheetValue, after: SheetValue) {
        if before == after || !self.sheet.set_value(field, after.clone()) {
            return;
        }
        let sheet = self.sheet.clone();
        self.persist(StorageKey::Sheet, &sheet);
        self.log_change(
            Change::SheetField { field: field.to_string(), before, after },
            format!("Modification du champ « {field} »"),
        );
        self.finish();
    }

    fn commit_citations(&mut self, before: SheetValue, description: &str) {
        let after = self.sheet.value(CITATIONS_FIELD);
        if before == after {
            return;
        }
        let sheet = self.sheet.clone();
        self.persist(StorageKey::Sheet, &sheet);
        self.log_change(
            Change::SheetField { field: CITATIONS_FIELD.to_string(), before, after },
            description.to_string(),
        );
        self.finish();
    }

    // Fixed-layout zone customizations

    /// Stored override or the defaults
    pub fn zone_customization(&self, zone_id: &str) -> ZoneCustomization {
        self.customizations.get(zone_id)
    }

    /// Merge an update. A pure background change logs `color`; anything
    /// else logs `customization` with the whole record.
    pub fn update_customization(&mut self, zone_id: &str, update: CustomizationUpdate) {
        if update == CustomizationUpdate::default() {
            return;
        }
        let color_only = update.custom_name.is_none() && update.is_visible.is_none() && update.is_deleted.is_none();
        let before = self.customizations.stored(zone_id).cloned();
        self.customizations.update(zone_id, update);
        let after = self.customizations.stored(zone_id).cloned();
        if before == after {
            return;
        }

        let change = if color_only {
            Change::Color {
                zone_id: zone_id.to_string(),
                before: before.map_or_else(|| self.customizations_default_color(zone_id), |c| c.background_color),
                after: after.and_then(|c| c.background_color),
            }
        } else {
            Change::Customization { zone_id: zone_id.to_string(), before, after }
        };
        let description = match change {
            Change::Color { .. } => format!("Couleur de la zone « {zone_id} »"),
            _ => format!("Personnalisation de la zone « {zone_id} »"),
        };
        self.commit_customizations(change, description);
    }

    fn customizations_default_color(&self, zone_id: &str) -> Option<String> {
        ZoneCustomization::default_for(zone_id).background_color
    }

    pub fn set_zone_color(&mut self, zone_id: &str, color: impl Into<String>) {
        self.update_customization(zone_id, CustomizationUpdate {
            background_color: Some(color.into()),
            ..CustomizationUpdate::default()
        });
    }

    pub fn rename_fixed_zone(&mut self, zone_id: &str, name: impl Into<String>) {
        self.update_customization(zone_id, CustomizationUpdate {
            custom_name: Some(name.into()),
            ..CustomizationUpdate::default()
        });
    }

    pub fn delete_fixed_zone(&mut self, zone_id: &str) {
        self.update_customization(zone_id, CustomizationUpdate {
            is_visible: Some(false),
            is_deleted: Some(true),
            ..CustomizationUpdate::default()
        });
    }

    pub fn restore_fixed_zone(&mut self, zone_id: &str) {
        self.update_customization(zone_id, CustomizationUpdate {
            is_visible: Some(true),
            is_deleted: Some(false),
            ..CustomizationUpdate::default()
        });
    }

    /// Drop the override so the zone returns to its defaults
    pub fn reset_customization(&mut self, zone_id: &str) {
        let Some(before) = self.customizations.reset(zone_id) else {
            return;
        };
        let change = Change::Customization { zone_id: zone_id.to_string(), before: Some(before), after: None };
        self.commit_customizations(change, format!("Réinitialisation de la zone « {zone_id} »"));
    }

    pub fn visible_fixed_zones<'a>(&self, zone_ids: &[&'a str]) -> Vec<&'a str> {
        self.customizations.visible_zones(zone_ids)
    }

    pub fn deleted_fixed_zones<'a>(&self, zone_ids: &[&'a str]) -> Vec<&'a str> {
        self.customizations.deleted_zones(zone_ids)
    }

    fn commit_customizations(&mut self, change: Change, description: String) {
        let customizations = self.customizations.clone();
        self.persist(StorageKey::ZoneCustomizations, &customizations);
        self.log_change(change, description);
        self.finish();
    }

    // Tabs

    pub fn tabs(&self) -> &[Tab] {
        self.tabs.tabs()
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.active()
    }

    pub fn set_active_tab(&mut self, tab_id: &str) -> bool {
        self.tabs.set_active(tab_id)
    }

    /// Append a user tab. Not logged.
    pub fn add_tab(&mut self, title: impl Into<String>, icon: Option<String>) -> String {
        let mut millis = Utc::now().timestamp_millis();
        let id = loop {
            let id = format!("tab-{millis}");
            if self.tabs.get(&id).is_none() {
                break id;
            }
            millis += 1;
        };
        self.tabs.add(id.clone(), title, icon.unwrap_or_else(|| DEFAULT_TAB_ICON.to_string()));
        self.persist_tabs();
        self.finish();
        id
    }

    /// Delete a user tab. Built-in tabs are kept. Not logged.
    pub fn delete_tab(&mut self, tab_id: &str) -> bool {
        if !self.tabs.delete(tab_id) {
            return false;
        }
        self.persist_tabs();
        self.finish();
        true
    }

    pub fn rename_tab(&mut self, tab_id: &str, title: impl Into<String>) {
        let title = title.into();
        let Some(before) = self.tabs.rename(tab_id, title.clone()) else {
            log::debug!("tab {tab_id} not found");
            return;
        };
        if before == title {
            return;
        }
        self.persist_tabs();
        self.log_change(
            Change::TabRename { tab_id: tab_id.to_string(), before: before.clone(), after: title.clone() },
            format!("Renommage de l'onglet « {before} » en « {title} »"),
        );
        self.finish();
    }

    /// Not logged.
    pub fn reorder_tabs(&mut self, from: usize, to: usize) -> bool {
        if from == to || !self.tabs.reorder(from, to) {
            return false;
        }
        self.persist_tabs();
        self.finish();
        true
    }

    /// Back to the built-in tabs after confirmation. Not logged.
    pub fn reset_tabs(&mut self, confirm: impl FnOnce(&str) -> bool) -> bool {
        if !confirm(RESET_TABS_PROMPT) {
            return false;
        }
        self.tabs.reset();
        self.persist_tabs();
        self.finish();
        true
    }

    fn persist_tabs(&mut self) {
        let tabs = self.tabs.tabs().to_vec();
        self.persist(StorageKey::Tabs, &tabs);
    }

    // Theme

    pub fn theme(&self) -> &ThemeSnapshot {
        &self.theme
    }

    /// Switch theme, recording the current one as `before`
    pub fn set_theme(&mut self, theme: ThemeSnapshot) {
        let before = self.theme.clone();
        self.record_theme_change(before, theme);
    }

    /// Persist `after` as the active theme and log the switch
    pub fn record_theme_change(&mut self, before: ThemeSnapshot, after: ThemeSnapshot) {
        if before == after {
            return;
        }
        self.theme = after.clone();
        self.persist(StorageKey::ActiveTheme, &after);
        let description = format!("Changement de thème : {} → {}", before.theme, after.theme);
        self.log_change(Change::Theme { before, after }, description);
        self.finish();
    }

    /// Saved custom themes by name. Their payload is opaque here.
    pub fn custom_themes(&self) -> BTreeMap<String, serde_json::Value> {
        self.state.load(StorageKey::CustomThemes)
    }

    /// Save or overwrite a custom theme. Not logged.
    pub fn save_custom_theme(&mut self, name: impl Into<String>, data: serde_json::Value) {
        let mut themes = self.custom_themes();
        themes.insert(name.into(), data);
        self.persist(StorageKey::CustomThemes, &themes);
        self.finish();
    }

    /// Not logged. A theme snapshot already in history keeps its own copy.
    pub fn delete_custom_theme(&mut self, name: &str) -> bool {
        let mut themes = self.custom_themes();
        if themes.remove(name).is_none() {
            return false;
        }
        self.persist(StorageKey::CustomThemes, &themes);
        self.finish();
        true
    }
}
