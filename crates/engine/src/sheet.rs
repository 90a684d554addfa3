//! The reading sheet: named text fields plus a citation list.
//!
//! Field semantics belong to the editor widgets; the engine only stores
//! values and records their history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field name of the citation list
pub const CITATIONS_FIELD: &str = "citations";

/// Text fields of a fresh sheet, in form order
pub const FIELD_NAMES: [&str; 30] = [
    "titre", "auteur", "resume", "plan", "temporalites", "pointsVue",
    "personnages", "registres", "rythme", "figures", "procedes", "lexique",
    "axes", "tensions", "lectures", "intuitions", "images", "fonction",
    "references", "biographie", "place", "courants", "contexte", "reception",
    "oeuvres", "thematiques", "convergence", "glossaire", "notes", "schemas",
];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Citation {
    pub text: String,
    pub page: String,
}

/// Which half of a citation an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationPart {
    Text,
    Page,
}

/// Value of one sheet field, as captured by history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetValue {
    Text(String),
    Citations(Vec<Citation>),
}

/// Persisted as one flat JSON object: every text field at the top level,
/// plus `citations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSheet {
    #[serde(default = "default_citations")]
    pub citations: Vec<Citation>,
    #[serde(flatten)]
    fields: BTreeMap<String, String>,
}

fn default_citations() -> Vec<Citation> {
    vec![Citation::default()]
}

impl Default for ReadingSheet {
    fn default() -> Self {
        Self {
            citations: default_citations(),
            fields: FIELD_NAMES.iter().map(|name| (name.to_string(), String::new())).collect(),
        }
    }
}

impl ReadingSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of a field; unknown fields read as empty
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Snapshot a field for history
    pub fn value(&self, name: &str) -> SheetValue {
        if name == CITATIONS_FIELD {
            SheetValue::Citations(self.citations.clone())
        } else {
            SheetValue::Text(self.field(name).to_string())
        }
    }

    /// Write a snapshot back. A value of the wrong shape for the field is
    /// ignored and reported as `false`.
    pub fn set_value(&mut self, name: &str, value: SheetValue) -> bool {
        match (name == CITATIONS_FIELD, value) {
            (true, SheetValue::Citations(citations)) => {
                self.citations = citations;
                true
            }
            (false, SheetValue::Text(text)) => {
                self.set_field(name, text);
                true
            }
            _ => false,
        }
    }

    /// Edit one citation. Out-of-range indices are ignored.
    pub fn update_citation(&mut self, index: usize, part: CitationPart, value: impl Into<String>) -> bool {
        let Some(citation) = self.citations.get_mut(index) else {
            return false;
        };
        match part {
            CitationPart::Text => citation.text = value.into(),
            CitationPart::Page => citation.page = value.into(),
        }
        true
    }

    pub fn add_citation(&mut self) {
        self.citations.push(Citation::default());
    }

    /// Remove a citation. The last remaining citation is never removed.
    pub fn remove_citation(&mut self, index: usize) -> bool {
        if self.citations.len() <= 1 || index >= self.citations.len() {
            return false;
        }
        self.citations.remove(index);
        true
    }

    /// File-name friendly version of the title
    pub fn slug(&self) -> String {
        let slug: String = self
            .field("titre")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        if slug.is_empty() {
            "untitled".to_string()
        } else {
            slug
        }
    }
}
