//! Sheet tabs: eight built-in sections plus user-added ones.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub is_default: bool,
    pub order: u32,
}

pub const DEFAULT_TAB_ICON: &str = "📝";

const DEFAULT_TABS: [(&str, &str, &str); 8] = [
    ("resume-architecture", "Résumé & Architecture", "📘"),
    ("analyse-stylistique", "Analyse stylistique", "🖋️"),
    ("problematiques-enjeux", "Problématiques & Enjeux", "🧠"),
    ("images-oeuvre", "Images dans l'œuvre", "🖼️"),
    ("contexte-perspectives", "Contexte & Perspectives", "🔍"),
    ("comparatisme", "Comparatisme", "🔄"),
    ("annexes", "Annexes", "📂"),
    ("custom-zones-main", "Zones personnalisées", "🎨"),
];

pub fn default_tabs() -> Vec<Tab> {
    DEFAULT_TABS
        .iter()
        .enumerate()
        .map(|(i, (id, title, icon))| Tab {
            id: id.to_string(),
            title: title.to_string(),
            icon: icon.to_string(),
            is_default: true,
            order: i as u32 + 1,
        })
        .collect()
}

/// Ordered tab list with an active tab.
#[derive(Debug, Clone, PartialEq)]
pub struct TabStore {
    tabs: Vec<Tab>,
    active: Option<String>,
}

impl Default for TabStore {
    fn default() -> Self {
        Self::from_tabs(default_tabs())
    }
}

impl TabStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted tabs; an empty list falls back to the defaults
    pub fn from_tabs(tabs: Vec<Tab>) -> Self {
        let tabs = if tabs.is_empty() { default_tabs() } else { tabs };
        let active = tabs.first().map(|t| t.id.clone());
        Self { tabs, active }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn get(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn active(&self) -> Option<&Tab> {
        self.active.as_deref().and_then(|id| self.get(id))
    }

    pub fn set_active(&mut self, id: &str) -> bool {
        if self.get(id).is_some() {
            self.active = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Append a user tab and make it active
    pub fn add(&mut self, id: String, title: impl Into<String>, icon: impl Into<String>) -> &Tab {
        let tab = Tab {
            id: id.clone(),
            title: title.into(),
            icon: icon.into(),
            is_default: false,
            order: self.tabs.len() as u32 + 1,
        };
        self.tabs.push(tab);
        self.active = Some(id);
        &self.tabs[self.tabs.len() - 1]
    }

    /// Delete a user tab. Built-in tabs cannot be deleted.
    pub fn delete(&mut self, id: &str) -> bool {
        match self.get(id) {
            Some(tab) if !tab.is_default => {}
            _ => return false,
        }
        self.tabs.retain(|t| t.id != id);
        if self.active.as_deref() == Some(id) {
            self.active = self.tabs.first().map(|t| t.id.clone());
        }
        true
    }

    /// Rename a tab, returning the previous title
    pub fn rename(&mut self, id: &str, title: impl Into<String>) -> Option<String> {
        let tab = self.tabs.iter_mut().find(|t| t.id == id)?;
        Some(std::mem::replace(&mut tab.title, title.into()))
    }

    /// Move a tab and renumber `order` from 1
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.tabs.len() || to >= self.tabs.len() {
            return false;
        }
        let tab = self.tabs.remove(from);
        self.tabs.insert(to, tab);
        for (i, tab) in self.tabs.iter_mut().enumerate() {
            tab.order = i as u32 + 1;
        }
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Replace the list from storage, keeping the active tab when it still exists
    pub fn replace(&mut self, tabs: Vec<Tab>) {
        let active = self.active.take();
        *self = Self::from_tabs(tabs);
        if let Some(id) = active {
            self.set_active(&id);
        }
    }
}
