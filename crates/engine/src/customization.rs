//! Per-zone overrides for the fixed-layout sheet zones.
//!
//! This is a lighter layer than [`crate::zone::Zone`]: the fixed zones have
//! no geometry, only a display name, a background color and the same
//! visible/deleted pair.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKGROUND: &str = "#ffffff";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneCustomization {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

impl ZoneCustomization {
    /// Defaults for a zone with no stored override
    pub fn default_for(zone_id: &str) -> Self {
        Self {
            id: zone_id.to_string(),
            custom_name: None,
            background_color: Some(DEFAULT_BACKGROUND.to_string()),
            is_visible: Some(true),
            is_deleted: Some(false),
        }
    }

    pub fn is_live(&self) -> bool {
        self.is_visible.unwrap_or(true) && !self.is_deleted.unwrap_or(false)
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted.unwrap_or(false)
    }
}

/// Partial customization update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomizationUpdate {
    pub custom_name: Option<String>,
    pub background_color: Option<String>,
    pub is_visible: Option<bool>,
    pub is_deleted: Option<bool>,
}

/// Map of zone id to override, persisted as one JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneCustomizations {
    entries: BTreeMap<String, ZoneCustomization>,
}

impl ZoneCustomizations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored override, if any
    pub fn stored(&self, zone_id: &str) -> Option<&ZoneCustomization> {
        self.entries.get(zone_id)
    }

    /// Stored override or the defaults
    pub fn get(&self, zone_id: &str) -> ZoneCustomization {
        self.entries
            .get(zone_id)
            .cloned()
            .unwrap_or_else(|| ZoneCustomization::default_for(zone_id))
    }

    /// Merge an update over the current (or default) customization
    pub fn update(&mut self, zone_id: &str, update: CustomizationUpdate) {
        let mut current = self.get(zone_id);
        if let Some(name) = update.custom_name {
            current.custom_name = Some(name);
        }
        if let Some(color) = update.background_color {
            current.background_color = Some(color);
        }
        if let Some(visible) = update.is_visible {
            current.is_visible = Some(visible);
        }
        if let Some(deleted) = update.is_deleted {
            current.is_deleted = Some(deleted);
        }
        self.entries.insert(zone_id.to_string(), current);
    }

    /// Replace or drop the stored override wholesale (history replay)
    pub fn put(&mut self, zone_id: &str, customization: Option<ZoneCustomization>) {
        match customization {
            Some(c) => {
                self.entries.insert(zone_id.to_string(), c);
            }
            None => {
                self.entries.remove(zone_id);
            }
        }
    }

    /// Set only the background color, keeping the rest of the record
    pub fn set_background(&mut self, zone_id: &str, color: Option<String>) {
        let mut current = self.get(zone_id);
        current.background_color = color;
        self.entries.insert(zone_id.to_string(), current);
    }

    pub fn delete_zone(&mut self, zone_id: &str) {
        self.update(zone_id, CustomizationUpdate {
            is_visible: Some(false),
            is_deleted: Some(true),
            ..Default::default()
        });
    }

    pub fn restore_zone(&mut self, zone_id: &str) {
        self.update(zone_id, CustomizationUpdate {
            is_visible: Some(true),
            is_deleted: Some(false),
            ..Default::default()
        });
    }

    /// Drop the override, returning the zone to defaults
    pub fn reset(&mut self, zone_id: &str) -> Option<ZoneCustomization> {
        self.entries.remove(zone_id)
    }

    pub fn visible_zones<'a>(&self, zone_ids: &[&'a str]) -> Vec<&'a str> {
        zone_ids.iter().copied().filter(|id| self.get(id).is_live()).collect()
    }

    pub fn deleted_zones<'a>(&self, zone_ids: &[&'a str]) -> Vec<&'a str> {
        zone_ids.iter().copied().filter(|id| self.get(id).is_deleted()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
