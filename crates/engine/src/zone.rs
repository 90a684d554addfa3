//! Freeform annotation zones and the zone type catalogue.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fiche_core::{Bounds, Position, Size};
use serde::{Deserialize, Serialize};

/// Footprint of a freshly created zone
pub const DEFAULT_ZONE_SIZE: Size = Size::new(300.0, 120.0);

/// Smallest size a zone can be resized to
pub const MIN_ZONE_SIZE: Size = Size::new(150.0, 80.0);

/// Stacking order given to new zones
pub const DEFAULT_Z_INDEX: i64 = 1;

/// Closed set of zone kinds. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    Text,
    Import,
    Citation,
    Notes,
    Custom,
}

impl ZoneType {
    pub const ALL: [ZoneType; 5] = [
        ZoneType::Text,
        ZoneType::Import,
        ZoneType::Citation,
        ZoneType::Notes,
        ZoneType::Custom,
    ];

    /// Identifier used in zone ids (`zone-{type}-{millis}`)
    pub const fn as_str(self) -> &'static str {
        match self {
            ZoneType::Text => "text",
            ZoneType::Import => "import",
            ZoneType::Citation => "citation",
            ZoneType::Notes => "notes",
            ZoneType::Custom => "custom",
        }
    }

    pub fn config(self) -> &'static ZoneTypeConfig {
        match self {
            ZoneType::Text => &TEXT_CONFIG,
            ZoneType::Import => &IMPORT_CONFIG,
            ZoneType::Citation => &CITATION_CONFIG,
            ZoneType::Notes => &NOTES_CONFIG,
            ZoneType::Custom => &CUSTOM_CONFIG,
        }
    }
}

/// Default presentation and capabilities of a zone type
#[derive(Debug)]
pub struct ZoneTypeConfig {
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub default_content: &'static str,
    pub placeholder: &'static str,
    pub background_color: &'static str,
    pub border_color: &'static str,
    pub text_color: &'static str,
    pub allow_file_upload: bool,
    pub allow_rich_text: bool,
    pub custom_styles: &'static [(&'static str, &'static str)],
}

impl ZoneTypeConfig {
    pub fn styles(&self) -> BTreeMap<String, String> {
        self.custom_styles
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

static TEXT_CONFIG: ZoneTypeConfig = ZoneTypeConfig {
    name: "Zone de texte",
    icon: "📝",
    description: "Zone de texte avec éditeur complet",
    default_content: "",
    placeholder: "Saisissez votre texte ici...",
    background_color: "#f8f9fa",
    border_color: "#dee2e6",
    text_color: "#495057",
    allow_file_upload: false,
    allow_rich_text: true,
    custom_styles: &[
        ("minHeight", "120px"),
        ("padding", "15px"),
        ("borderRadius", "8px"),
        ("lineHeight", "1.6"),
    ],
};

static IMPORT_CONFIG: ZoneTypeConfig = ZoneTypeConfig {
    name: "Zone d'importation",
    icon: "📁",
    description: "Zone pour images, documents et fichiers",
    default_content: "",
    placeholder: "Glissez-déposez vos fichiers ici ou cliquez pour sélectionner...",
    background_color: "#e3f2fd",
    border_color: "#2196f3",
    text_color: "#1976d2",
    allow_file_upload: true,
    allow_rich_text: false,
    custom_styles: &[
        ("minHeight", "150px"),
        ("padding", "20px"),
        ("borderRadius", "12px"),
        ("border", "2px dashed #2196f3"),
        ("textAlign", "center"),
    ],
};

static CITATION_CONFIG: ZoneTypeConfig = ZoneTypeConfig {
    name: "Zone de citation",
    icon: "💬",
    description: "Zone pour citations avec formatage spécial",
    default_content: "",
    placeholder: "Saisissez votre citation ici...",
    background_color: "#fff3e0",
    border_color: "#ff9800",
    text_color: "#e65100",
    allow_file_upload: false,
    allow_rich_text: true,
    custom_styles: &[
        ("minHeight", "100px"),
        ("padding", "15px"),
        ("borderRadius", "8px"),
        ("borderLeft", "4px solid #ff9800"),
        ("fontStyle", "italic"),
        ("position", "relative"),
    ],
};

static NOTES_CONFIG: ZoneTypeConfig = ZoneTypeConfig {
    name: "Zone de notes",
    icon: "📌",
    description: "Zone pour notes personnelles avec style différent",
    default_content: "",
    placeholder: "Ajoutez vos notes personnelles...",
    background_color: "#f3e5f5",
    border_color: "#9c27b0",
    text_color: "#4a148c",
    allow_file_upload: false,
    allow_rich_text: true,
    custom_styles: &[
        ("minHeight", "100px"),
        ("padding", "15px"),
        ("borderRadius", "8px"),
        ("border", "1px solid #9c27b0"),
        ("fontSize", "0.9em"),
    ],
};

static CUSTOM_CONFIG: ZoneTypeConfig = ZoneTypeConfig {
    name: "Zone personnalisée",
    icon: "🎨",
    description: "Zone libre avec options de personnalisation",
    default_content: "",
    placeholder: "Contenu personnalisé...",
    background_color: "#ffffff",
    border_color: "#6c757d",
    text_color: "#495057",
    allow_file_upload: true,
    allow_rich_text: true,
    custom_styles: &[
        ("minHeight", "120px"),
        ("padding", "15px"),
        ("borderRadius", "8px"),
        ("border", "1px solid #6c757d"),
    ],
};

/// Attachment descriptor. The blob itself lives wherever `url` points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    /// MIME type
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub url: String,
    pub upload_date: DateTime<Utc>,
}

/// A freeform annotation on the zone canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    pub title: String,
    pub content: String,
    pub position: Position,
    pub size: Size,
    pub z_index: i64,
    pub is_visible: bool,
    pub is_deleted: bool,
    #[serde(default)]
    pub custom_styles: BTreeMap<String, String>,
    #[serde(default)]
    pub uploaded_files: Vec<UploadedFile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Render state of a zone. Exactly one applies at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneState {
    Live,
    Hidden,
    Deleted,
}

impl Zone {
    /// A new live zone with the type's defaults
    pub fn new(id: String, zone_type: ZoneType, title: String, position: Position, now: DateTime<Utc>) -> Self {
        let config = zone_type.config();
        Self {
            id,
            zone_type,
            title,
            content: config.default_content.to_string(),
            position,
            size: DEFAULT_ZONE_SIZE,
            z_index: DEFAULT_Z_INDEX,
            is_visible: true,
            is_deleted: false,
            custom_styles: config.styles(),
            uploaded_files: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> ZoneState {
        if self.is_deleted {
            ZoneState::Deleted
        } else if self.is_visible {
            ZoneState::Live
        } else {
            ZoneState::Hidden
        }
    }

    pub fn is_live(&self) -> bool {
        self.state() == ZoneState::Live
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.position, self.size)
    }

    /// Refresh `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Soft-delete flags
    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.is_visible = false;
    }

    pub fn mark_restored(&mut self) {
        self.is_deleted = false;
        self.is_visible = true;
    }
}

/// Partial update merged into a zone by `update_zone`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub z_index: Option<i64>,
    pub is_visible: Option<bool>,
    pub is_deleted: Option<bool>,
    pub custom_styles: Option<BTreeMap<String, String>>,
    pub uploaded_files: Option<Vec<UploadedFile>>,
}

impl ZoneUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), ..Self::default() }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Self::default() }
    }

    pub fn visibility(is_visible: bool) -> Self {
        Self { is_visible: Some(is_visible), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge into `zone`. Does not touch `updated_at`.
    pub fn apply_to(self, zone: &mut Zone) {
        if let Some(title) = self.title {
            zone.title = title;
        }
        if let Some(content) = self.content {
            zone.content = content;
        }
        if let Some(position) = self.position {
            zone.position = position;
        }
        if let Some(size) = self.size {
            zone.size = size;
        }
        if let Some(z_index) = self.z_index {
            zone.z_index = z_index;
        }
        if let Some(is_visible) = self.is_visible {
            zone.is_visible = is_visible;
        }
        if let Some(is_deleted) = self.is_deleted {
            zone.is_deleted = is_deleted;
        }
        if let Some(custom_styles) = self.custom_styles {
            zone.custom_styles = custom_styles;
        }
        if let Some(uploaded_files) = self.uploaded_files {
            zone.uploaded_files = uploaded_files;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Zone {
        Zone::new(
            "zone-text-1".into(),
            ZoneType::Text,
            "Notes".into(),
            Position::new(50.0, 50.0),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_zone_defaults() {
        let zone = sample();
        assert_eq!(zone.size, DEFAULT_ZONE_SIZE);
        assert_eq!(zone.z_index, 1);
        assert!(zone.is_live());
        assert_eq!(zone.custom_styles.get("lineHeight").map(String::as_str), Some("1.6"));
        assert_eq!(zone.created_at, zone.updated_at);
    }

    #[test]
    fn test_render_states_are_exclusive() {
        let mut zone = sample();
        assert_eq!(zone.state(), ZoneState::Live);

        zone.is_visible = false;
        assert_eq!(zone.state(), ZoneState::Hidden);

        zone.mark_deleted();
        assert_eq!(zone.state(), ZoneState::Deleted);
        assert!(!zone.is_visible);

        zone.mark_restored();
        assert_eq!(zone.state(), ZoneState::Live);
    }

    #[test]
    fn test_update_merges_only_given_fields() {
        let mut zone = sample();
        ZoneUpdate::content("hello").apply_to(&mut zone);
        assert_eq!(zone.content, "hello");
        assert_eq!(zone.title, "Notes");
        assert!(ZoneUpdate::default().is_empty());
        assert!(!ZoneUpdate::title("x").is_empty());
    }

    #[test]
    fn test_persisted_shape() {
        let zone = sample();
        let json = serde_json::to_value(&zone).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["zIndex"], 1);
        assert_eq!(json["isDeleted"], false);
        assert!(json.get("uploadedFiles").is_some());

        let back: Zone = serde_json::from_value(json).unwrap();
        assert_eq!(back, zone);
    }

    #[test]
    fn test_catalogue() {
        for zone_type in ZoneType::ALL {
            let config = zone_type.config();
            assert!(!config.name.is_empty());
            assert!(config.background_color.starts_with('#'));
        }
        assert!(ZoneType::Import.config().allow_file_upload);
        assert!(!ZoneType::Import.config().allow_rich_text);
    }
}
