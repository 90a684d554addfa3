// Theme configuration
// Supports: built-in palettes and custom JSON themes

use crate::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// JSON-serializable theme palette (hex strings)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePalette {
    pub name: String,
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_card")]
    pub card: String,
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_text_light")]
    pub text_light: String,
    #[serde(default = "default_border")]
    pub border: String,
}

fn default_background() -> String { "#f8f9fa".into() }
fn default_card() -> String { "#ffffff".into() }
fn default_text() -> String { "#2c3e50".into() }
fn default_text_light() -> String { "#6c757d".into() }
fn default_border() -> String { "#e9ecef".into() }

impl ThemePalette {
    fn builtin(name: &str, primary: &str, secondary: &str, accent: &str) -> Self {
        Self {
            name: name.into(),
            primary: primary.into(),
            secondary: secondary.into(),
            accent: accent.into(),
            background: default_background(),
            card: default_card(),
            text: default_text(),
            text_light: default_text_light(),
            border: default_border(),
        }
    }

    fn with_surface(mut self, background: &str, border: &str) -> Self {
        self.background = background.into();
        self.border = border.into();
        self
    }

    /// CSS gradient used by the exporters' headers
    pub fn gradient(&self) -> String {
        format!(
            "linear-gradient(135deg, {} 0%, {} 100%)",
            self.primary, self.secondary
        )
    }
}

/// Runtime theme colors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeColors {
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,
    pub background: Color,
    pub card: Color,
    pub text: Color,
    pub text_light: Color,
    pub border: Color,
}

impl ThemeColors {
    /// Resolve a palette; unparsable entries fall back to the default palette's color
    pub fn from_palette(palette: &ThemePalette) -> Self {
        let fallback = |hex: &str, default: &str| {
            Color::parse_hex(hex)
                .or_else(|| Color::parse_hex(default))
                .unwrap_or(Color::from_rgb(0.0, 0.0, 0.0))
        };
        ThemeColors {
            primary: fallback(&palette.primary, "#667eea"),
            secondary: fallback(&palette.secondary, "#764ba2"),
            accent: fallback(&palette.accent, "#8e44ad"),
            background: fallback(&palette.background, "#f8f9fa"),
            card: fallback(&palette.card, "#ffffff"),
            text: fallback(&palette.text, "#2c3e50"),
            text_light: fallback(&palette.text_light, "#6c757d"),
            border: fallback(&palette.border, "#e9ecef"),
        }
    }
}

/// The active theme as recorded in history. Opaque to the engine: it is
/// stored and re-broadcast, never interpreted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSnapshot {
    /// Built-in theme id or custom theme name
    pub theme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_theme_data: Option<serde_json::Value>,
}

impl ThemeSnapshot {
    pub fn builtin(theme: impl Into<String>) -> Self {
        Self { theme: theme.into(), custom_theme_data: None }
    }
}

/// Built-in palettes keyed by id, in menu order
pub fn builtin_themes() -> Vec<(&'static str, ThemePalette)> {
    vec![
        ("purple", ThemePalette::builtin("Violet", "#667eea", "#764ba2", "#8e44ad")),
        ("blue", ThemePalette::builtin("Bleu", "#3498db", "#2980b9", "#1abc9c")),
        ("green", ThemePalette::builtin("Vert", "#27ae60", "#2ecc71", "#16a085")),
        ("orange", ThemePalette::builtin("Orange", "#e67e22", "#f39c12", "#d35400")),
        ("pink", ThemePalette::builtin("Rose", "#e91e63", "#ad1457", "#c2185b")),
        ("dark", ThemePalette::builtin("Sombre", "#2c3e50", "#34495e", "#1a252f")),
        ("rose", ThemePalette::builtin("Rose pastel", "#f8bbd9", "#f4a6cd", "#e8739e")
            .with_surface("#fdf2f8", "#f3e8ff")),
        ("bleu", ThemePalette::builtin("Bleu pastel", "#a8d8ea", "#91c7e0", "#6ba3d6")
            .with_surface("#f0f8ff", "#e0f2fe")),
        ("vert", ThemePalette::builtin("Vert pastel", "#b8e6b8", "#a5dba5", "#7cc87c")
            .with_surface("#f0fff0", "#e8f5e8")),
        ("jaune", ThemePalette::builtin("Jaune pastel", "#fff3cd", "#ffecb3", "#fdd835")
            .with_surface("#fffef7", "#fef7cd")),
    ]
}

/// Look up a built-in palette by id
pub fn builtin_theme(id: &str) -> Option<ThemePalette> {
    builtin_themes()
        .into_iter()
        .find(|(key, _)| *key == id)
        .map(|(_, palette)| palette)
}

/// Get the custom themes directory path
pub fn custom_themes_dir() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join(crate::APP_DIR).join("themes"))
}

/// Load a custom theme from a JSON file
pub fn load_custom_theme(path: &Path) -> Option<ThemePalette> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("Failed to read custom theme {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(palette) => Some(palette),
        Err(e) => {
            log::warn!("Failed to parse custom theme {}: {}", path.display(), e);
            None
        }
    }
}

/// List custom themes found in `dir` (non-JSON and unparsable files are skipped)
pub fn list_custom_themes(dir: &Path) -> Vec<(PathBuf, ThemePalette)> {
    let mut themes = Vec::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(palette) = load_custom_theme(&path) {
                    themes.push((path, palette));
                }
            }
        }
    }
    themes.sort_by(|a, b| a.1.name.cmp(&b.1.name));
    themes
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_builtin_catalogue() {
        let themes = builtin_themes();
        assert_eq!(themes.len(), 10);
        assert_eq!(themes[0].0, "purple");
        let bleu = builtin_theme("bleu").unwrap();
        assert_eq!(bleu.background, "#f0f8ff");
        assert!(builtin_theme("missing").is_none());
    }

    #[test]
    fn test_gradient() {
        let purple = builtin_theme("purple").unwrap();
        assert_eq!(purple.gradient(), "linear-gradient(135deg, #667eea 0%, #764ba2 100%)");
    }

    #[test]
    fn test_colors_fall_back_on_bad_hex() {
        let mut palette = builtin_theme("purple").unwrap();
        palette.accent = "not-a-color".into();
        let colors = ThemeColors::from_palette(&palette);
        assert_eq!(colors.accent, Color::parse_hex("#8e44ad").unwrap());
    }

    #[test]
    fn test_snapshot_serde() {
        let snapshot = ThemeSnapshot {
            theme: "custom".into(),
            custom_theme_data: Some(serde_json::json!({"primary": "#123456"})),
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("customThemeData"));
        let back: ThemeSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);

        let plain = serde_json::to_string(&ThemeSnapshot::builtin("dark")).unwrap();
        assert_eq!(plain, r#"{"theme":"dark"}"#);
    }

    #[test]
    fn test_list_custom_themes() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("ocean.json"),
            r##"{"name": "Ocean", "primary": "#0077be", "secondary": "#005f99", "accent": "#00a3e0"}"##,
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let themes = list_custom_themes(dir.path());
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].1.name, "Ocean");
        assert_eq!(themes[0].1.card, "#ffffff");
    }
}
