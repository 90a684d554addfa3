// Application settings
// Loaded from ~/.config/fiche-lecture/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default grid pitch for snapping, in canvas pixels
pub const DEFAULT_GRID_SIZE: f64 = 20.0;

/// Default number of history entries retained
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Zone canvas
    #[serde(rename = "canvas.snapToGrid")]
    pub snap_to_grid: bool,

    #[serde(rename = "canvas.gridSize")]
    pub grid_size: f64,

    #[serde(rename = "canvas.showDeletedZones")]
    pub show_deleted_zones: bool,

    // Undo/redo
    #[serde(rename = "history.maxEntries")]
    pub history_limit: usize,

    // Theme
    #[serde(rename = "theme.active")]
    pub active_theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snap_to_grid: true,
            grid_size: DEFAULT_GRID_SIZE,
            show_deleted_zones: false,
            history_limit: DEFAULT_HISTORY_LIMIT,
            active_theme: "purple".to_string(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::APP_DIR)
            .join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring `//` comment lines
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut settings: Settings = serde_json::from_str(&cleaned)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Save current settings to the default location
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Replace out-of-range values with defaults
    fn sanitize(&mut self) {
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            log::warn!("Invalid canvas.gridSize {}, using {}", self.grid_size, DEFAULT_GRID_SIZE);
            self.grid_size = DEFAULT_GRID_SIZE;
        }
        if self.history_limit == 0 {
            log::warn!("history.maxEntries must be positive, using {}", DEFAULT_HISTORY_LIMIT);
            self.history_limit = DEFAULT_HISTORY_LIMIT;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.snap_to_grid);
        assert_eq!(settings.grid_size, 20.0);
        assert_eq!(settings.history_limit, 100);
    }

    #[test]
    fn test_parse_with_comments_and_missing_keys() {
        let json = r#"{
    // Canvas
    "canvas.snapToGrid": false,
    "history.maxEntries": 50
}"#;
        let settings = Settings::parse(json).unwrap();
        assert!(!settings.snap_to_grid);
        assert_eq!(settings.history_limit, 50);
        assert_eq!(settings.grid_size, DEFAULT_GRID_SIZE);
        assert_eq!(settings.active_theme, "purple");
    }

    #[test]
    fn test_sanitize_bad_values() {
        let settings = Settings::parse(r#"{"canvas.gridSize": 0, "history.maxEntries": 0}"#).unwrap();
        assert_eq!(settings.grid_size, DEFAULT_GRID_SIZE);
        assert_eq!(settings.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings {
            snap_to_grid: false,
            grid_size: 10.0,
            active_theme: "vert".into(),
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path), settings);
    }
}
