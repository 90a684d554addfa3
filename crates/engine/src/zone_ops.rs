//! Zone store and canvas operations on [`Document`].
//!
//! Not-found ids are benign: every operation returns quietly.

use chrono::Utc;
use fiche_core::{Bounds, Position, Size};
use rand::Rng;

use crate::document::Document;
use crate::gesture::ZoneCanvas;
use crate::history::Change;
use crate::placement::{floor_size, PlacementPolicy};
use crate::zone::{UploadedFile, Zone, ZoneType, ZoneUpdate};

/// Offset applied to a duplicated zone
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// Highest stacking order considered by "send to back"
const Z_INDEX_CEILING: i64 = 999;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub const CLEAR_ALL_PROMPT: &str = "Êtes-vous sûr de vouloir supprimer toutes les zones personnalisées ?";

impl Document {
    // Queries

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == zone_id)
    }

    /// Live zones: visible and not deleted
    pub fn visible_zones(&self) -> Vec<&Zone> {
        self.zones.iter().filter(|z| z.is_live()).collect()
    }

    pub fn deleted_zones(&self) -> Vec<&Zone> {
        self.zones.iter().filter(|z| z.is_deleted).collect()
    }

    /// Non-deleted zones of one type
    pub fn zones_by_type(&self, zone_type: ZoneType) -> Vec<&Zone> {
        self.zones
            .iter()
            .filter(|z| z.zone_type == zone_type && !z.is_deleted)
            .collect()
    }

    /// Zones to draw, bottom of the stack first. Deleted zones are included
    /// only when the settings ask for them.
    pub fn rendered_zones(&self) -> Vec<&Zone> {
        let mut zones: Vec<&Zone> = self
            .zones
            .iter()
            .filter(|z| z.is_live() || (self.show_deleted && z.is_deleted))
            .collect();
        zones.sort_by_key(|z| z.z_index);
        zones
    }

    pub fn selected_zone(&self) -> Option<&str> {
        self.selected_zone.as_deref()
    }

    pub fn selected(&self) -> Option<&Zone> {
        self.selected_zone.as_deref().and_then(|id| self.zone(id))
    }

    pub fn select_zone(&mut self, zone_id: Option<&str>) {
        self.selected_zone = zone_id.map(str::to_string);
    }

    pub fn drag_mode(&self) -> bool {
        self.drag_mode
    }

    pub fn set_drag_mode(&mut self, enabled: bool) {
        self.drag_mode = enabled;
    }

    pub fn placement(&self) -> PlacementPolicy {
        self.placement
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas_size
    }

    /// Record the container's current pixel size
    pub fn set_canvas_size(&mut self, size: Size) {
        self.canvas_size = size;
    }

    fn zone_index(&self, zone_id: &str) -> Option<usize> {
        let index = self.zones.iter().position(|z| z.id == zone_id);
        if index.is_none() {
            log::debug!("zone {zone_id} not found");
        }
        index
    }

    /// `zone-{type}-{millis}`, bumped past ids already in use
    fn next_zone_id(&self, zone_type: ZoneType, millis: i64) -> String {
        let mut millis = millis;
        loop {
            let id = format!("zone-{}-{}", zone_type.as_str(), millis);
            if !self.zones.iter().any(|z| z.id == id) {
                return id;
            }
            millis += 1;
        }
    }

    // Store operations

    /// Create a zone and select it. A missing title becomes
    /// `"{type name} {count + 1}"`; a missing position is random.
    pub fn create_zone(&mut self, zone_type: ZoneType, title: Option<String>, position: Option<Position>) -> String {
        let now = Utc::now();
        let id = self.next_zone_id(zone_type, now.timestamp_millis());
        let title = title.unwrap_or_else(|| format!("{} {}", zone_type.config().name, self.zones.len() + 1));
        let position = position.unwrap_or_else(|| {
            Position::new(self.rng.gen_range(50.0..250.0), self.rng.gen_range(50.0..250.0))
        });

        let zone = Zone::new(id.clone(), zone_type, title, position, now);
        let description = format!("Création de la zone « {} »", zone.title);
        self.zones.push(zone.clone());
        self.selected_zone = Some(id.clone());

        self.persist_zones();
        self.log_change(Change::Create { zone }, description);
        self.finish();
        id
    }

    /// Create a zone at a collision-free spot on the current canvas
    pub fn place_zone(&mut self, zone_type: ZoneType, title: Option<String>) -> String {
        let occupied: Vec<Bounds> = self.zones.iter().filter(|z| z.is_live()).map(Zone::bounds).collect();
        let position = self.placement.initial_position(self.canvas_size, &occupied, &mut self.rng);
        self.create_zone(zone_type, title, Some(position))
    }

    /// Merge a partial update. Title changes log `rename`, content changes
    /// log `content`; other fields are not logged.
    pub fn update_zone(&mut self, zone_id: &str, update: ZoneUpdate) {
        let Some(index) = self.zone_index(zone_id) else {
            return;
        };
        let mut updated = self.zones[index].clone();
        update.apply_to(&mut updated);
        if updated == self.zones[index] {
            return;
        }
        updated.touch();
        let before = std::mem::replace(&mut self.zones[index], updated);
        self.persist_zones();

        let after = &self.zones[index];
        let mut changes = Vec::new();
        if before.title != after.title {
            changes.push((
                Change::ZoneRename { zone_id: zone_id.to_string(), before: before.title.clone(), after: after.title.clone() },
                format!("Renommage de « {} » en « {} »", before.title, after.title),
            ));
        }
        if before.content != after.content {
            changes.push((
                Change::ZoneContent { zone_id: zone_id.to_string(), before: before.content.clone(), after: after.content.clone() },
                format!("Modification du contenu de « {} »", after.title),
            ));
        }
        for (change, description) in changes {
            self.log_change(change, description);
        }
        self.finish();
    }

    pub fn set_zone_title(&mut self, zone_id: &str, title: impl Into<String>) {
        self.update_zone(zone_id, ZoneUpdate::title(title));
    }

    pub fn set_zone_content(&mut self, zone_id: &str, content: impl Into<String>) {
        self.update_zone(zone_id, ZoneUpdate::content(content));
    }

    /// Soft-hide without deleting. Not logged.
    pub fn set_zone_visibility(&mut self, zone_id: &str, is_visible: bool) {
        self.update_zone(zone_id, ZoneUpdate::visibility(is_visible));
    }

    /// Move to an already corrected position
    pub fn move_zone(&mut self, zone_id: &str, position: Position) {
        let Some(index) = self.zone_index(zone_id) else {
            return;
        };
        let zone = &mut self.zones[index];
        let before = zone.position;
        if before == position {
            return;
        }
        zone.position = position;
        zone.touch();
        let description = format!("Déplacement de « {} »", zone.title);

        self.persist_zones();
        self.log_change(Change::Move { zone_id: zone_id.to_string(), before, after: position }, description);
        self.finish();
    }

    /// Resize, never below the minimum footprint
    pub fn resize_zone(&mut self, zone_id: &str, size: Size) {
        let Some(index) = self.zone_index(zone_id) else {
            return;
        };
        let size = floor_size(size);
        let zone = &mut self.zones[index];
        let before = zone.size;
        if before == size {
            return;
        }
        zone.size = size;
        zone.touch();
        let description = format!("Redimensionnement de « {} »", zone.title);

        self.persist_zones();
        self.log_change(Change::Resize { zone_id: zone_id.to_string(), before, after: size }, description);
        self.finish();
    }

    /// Soft-delete. The full prior record is logged so undo is exact.
    pub fn delete_zone(&mut self, zone_id: &str) {
        let Some(index) = self.zone_index(zone_id) else {
            return;
        };
        if self.zones[index].is_deleted {
            return;
        }
        let before = self.zones[index].clone();
        let zone = &mut self.zones[index];
        zone.mark_deleted();
        zone.touch();
        if self.selected_zone.as_deref() == Some(zone_id) {
            self.selected_zone = None;
        }
        let description = format!("Suppression de « {} »", before.title);

        self.persist_zones();
        self.log_change(Change::Delete { before }, description);
        self.finish();
    }

    pub fn restore_zone(&mut self, zone_id: &str) {
        let Some(index) = self.zone_index(zone_id) else {
            return;
        };
        let zone = &mut self.zones[index];
        if !zone.is_deleted {
            return;
        }
        zone.mark_restored();
        zone.touch();
        let description = format!("Restauration de « {} »", zone.title);

        self.persist_zones();
        self.log_change(Change::Restore { zone_id: zone_id.to_string() }, description);
        self.finish();
    }

    /// Remove a zone for good after confirmation. Not logged and cannot be
    /// undone.
    pub fn permanently_delete_zone(&mut self, zone_id: &str, confirm: impl FnOnce(&str) -> bool) -> bool {
        let Some(index) = self.zone_index(zone_id) else {
            return false;
        };
        let prompt = format!("Supprimer définitivement la zone « {} » ?", self.zones[index].title);
        if !confirm(&prompt) {
            return false;
        }
        let removed = self.zones.remove(index);
        if self.selected_zone.as_deref() == Some(zone_id) {
            self.selected_zone = None;
        }
        log::info!("permanently deleted zone {}", removed.id);
        self.persist_zones();
        self.finish();
        true
    }

    /// Copy a zone under a new id, offset and suffixed " (copie)"
    pub fn duplicate_zone(&mut self, zone_id: &str) -> Option<String> {
        let index = self.zone_index(zone_id)?;
        let now = Utc::now();
        let original = &self.zones[index];
        let mut copy = original.clone();
        copy.id = self.next_zone_id(original.zone_type, now.timestamp_millis());
        copy.title = format!("{} (copie)", original.title);
        copy.position = original.position.offset(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        copy.created_at = now;
        copy.updated_at = now;

        let id = copy.id.clone();
        let description = format!("Duplication de « {} »", original.title);
        self.zones.push(copy.clone());

        self.persist_zones();
        self.log_change(Change::Create { zone: copy }, description);
        self.finish();
        Some(id)
    }

    /// Put a zone above every other one. Not logged.
    pub fn bring_to_front(&mut self, zone_id: &str) {
        let Some(index) = self.zone_index(zone_id) else {
            return;
        };
        let top = self.zones.iter().map(|z| z.z_index).max().unwrap_or(0).max(0);
        self.set_z_index(index, top + 1);
    }

    /// Put a zone below every other one, never below 0. Not logged.
    pub fn send_to_back(&mut self, zone_id: &str) {
        let Some(index) = self.zone_index(zone_id) else {
            return;
        };
        let bottom = self.zones.iter().map(|z| z.z_index).min().unwrap_or(Z_INDEX_CEILING).min(Z_INDEX_CEILING);
        self.set_z_index(index, (bottom - 1).max(0));
    }

    fn set_z_index(&mut self, index: usize, z_index: i64) {
        let zone = &mut self.zones[index];
        zone.z_index = z_index;
        zone.touch();
        self.persist_zones();
        self.finish();
    }

    /// Attach a file descriptor. Returns the new file id. Not logged.
    pub fn add_file_to_zone(&mut self, zone_id: &str, name: &str, mime_type: &str, size: u64, url: &str) -> Option<String> {
        let index = self.zone_index(zone_id)?;
        let now = Utc::now();
        let suffix: String = (0..9)
            .map(|_| ID_ALPHABET[self.rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        let file = UploadedFile {
            id: format!("file-{}-{}", now.timestamp_millis(), suffix),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size,
            url: url.to_string(),
            upload_date: now,
        };
        let id = file.id.clone();

        let mut files = self.zones[index].uploaded_files.clone();
        files.push(file);
        self.update_zone(zone_id, ZoneUpdate { uploaded_files: Some(files), ..ZoneUpdate::default() });
        Some(id)
    }

    pub fn remove_file_from_zone(&mut self, zone_id: &str, file_id: &str) -> bool {
        let Some(index) = self.zone_index(zone_id) else {
            return false;
        };
        let files = &self.zones[index].uploaded_files;
        if !files.iter().any(|f| f.id == file_id) {
            return false;
        }
        let remaining = files.iter().filter(|f| f.id != file_id).cloned().collect();
        self.update_zone(zone_id, ZoneUpdate { uploaded_files: Some(remaining), ..ZoneUpdate::default() });
        true
    }

    /// Remove every zone after confirmation. Not logged.
    pub fn clear_all_zones(&mut self, confirm: impl FnOnce(&str) -> bool) -> bool {
        if !confirm(CLEAR_ALL_PROMPT) {
            return false;
        }
        log::info!("cleared {} zone(s)", self.zones.len());
        self.zones.clear();
        self.selected_zone = None;
        self.persist_zones();
        self.finish();
        true
    }

    /// Live geometry update during a gesture: persisted and notified, not logged
    fn preview_bounds(&mut self, zone_id: &str, edit: impl FnOnce(&mut Zone)) {
        let Some(index) = self.zone_index(zone_id) else {
            return;
        };
        let zone = &mut self.zones[index];
        let before = zone.bounds();
        edit(zone);
        if zone.bounds() == before {
            return;
        }
        zone.touch();
        self.persist_zones();
        self.finish();
    }

    /// Append imported zones. Ids already in use are re-issued. Not logged.
    pub fn import_zones(&mut self, zones: Vec<Zone>) -> usize {
        let count = zones.len();
        let millis = Utc::now().timestamp_millis();
        for mut zone in zones {
            if self.zones.iter().any(|z| z.id == zone.id) {
                let id = self.next_zone_id(zone.zone_type, millis);
                log::debug!("imported zone {} collides, re-issued as {}", zone.id, id);
                zone.id = id;
            }
            self.zones.push(zone);
        }
        if count > 0 {
            self.persist_zones();
            self.finish();
        }
        count
    }
}

impl ZoneCanvas for Document {
    fn drag_mode(&self) -> bool {
        self.drag_mode
    }

    fn selected_zone(&self) -> Option<&str> {
        self.selected_zone.as_deref()
    }

    fn zone_bounds(&self, zone_id: &str) -> Option<Bounds> {
        self.zone(zone_id).filter(|z| !z.is_deleted).map(Zone::bounds)
    }

    fn container_size(&self) -> Size {
        self.canvas_size
    }

    fn placement(&self) -> PlacementPolicy {
        self.placement
    }

    fn select_zone(&mut self, zone_id: &str) {
        Document::select_zone(self, Some(zone_id));
    }

    fn bring_to_front(&mut self, zone_id: &str) {
        Document::bring_to_front(self, zone_id);
    }

    fn preview_move(&mut self, zone_id: &str, position: Position) {
        self.preview_bounds(zone_id, |zone| zone.position = position);
    }

    fn preview_resize(&mut self, zone_id: &str, size: Size) {
        let size = floor_size(size);
        self.preview_bounds(zone_id, |zone| zone.size = size);
    }

    fn commit_gesture(&mut self, zone_id: &str, start: Bounds) {
        let Some(zone) = self.zone(zone_id) else {
            return;
        };
        let end = zone.bounds();
        let title = zone.title.clone();
        let mut logged = false;

        if end.origin != start.origin {
            let change = Change::Move { zone_id: zone_id.to_string(), before: start.origin, after: end.origin };
            self.log_change(change, format!("Déplacement de « {title} »"));
            logged = true;
        }
        if end.size != start.size {
            let change = Change::Resize { zone_id: zone_id.to_string(), before: start.size, after: end.size };
            self.log_change(change, format!("Redimensionnement de « {title} »"));
            logged = true;
        }
        if logged {
            self.finish();
        }
    }
}
