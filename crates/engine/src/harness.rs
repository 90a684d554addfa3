//! Test harness for document operations with event tracking.
//!
//! This module provides `DocumentHarness`, a wrapper around `Document` that:
//! - Collects every `StoreEvent` the document broadcasts
//! - Counts `StorageChanged` notifications per operation
//! - Replays scripted `Op` sequences against the document
//!
//! Use this harness to check the notification contract without a UI.

use std::cell::RefCell;
use std::rc::Rc;

use fiche_core::{Position, Size};

use crate::document::Document;
use crate::events::EventCollector;
use crate::zone::ZoneType;

/// Scripted user operation.
#[derive(Debug, Clone)]
pub enum Op {
    Create { zone_type: ZoneType, title: String, position: Position },
    /// Index into the zones created so far by this script
    Move { zone: usize, position: Position },
    Resize { zone: usize, size: Size },
    Rename { zone: usize, title: String },
    Content { zone: usize, content: String },
    Delete { zone: usize },
    Restore { zone: usize },
}

/// Test harness wrapping Document with event tracking.
pub struct DocumentHarness {
    doc: Document,
    events: Rc<RefCell<EventCollector>>,
    created: Vec<String>,
}

impl DocumentHarness {
    /// Create a new harness with an empty in-memory document.
    pub fn new() -> Self {
        Self::with_document(Document::in_memory().with_seed(0))
    }

    /// Create a harness wrapping an existing document.
    pub fn with_document(mut doc: Document) -> Self {
        let events = Rc::new(RefCell::new(EventCollector::new()));
        let sink = Rc::clone(&events);
        doc.subscribe(Box::new(move |e| sink.borrow_mut().push(e.clone())));
        Self { doc, events, created: Vec::new() }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Get collected events.
    pub fn events(&self) -> std::cell::Ref<'_, EventCollector> {
        self.events.borrow()
    }

    /// Clear collected events.
    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    /// Ids of zones created through `apply`, in order.
    pub fn created(&self) -> &[String] {
        &self.created
    }

    /// Run `f` and return how many `StorageChanged` notifications it caused.
    pub fn notifications_during(&mut self, f: impl FnOnce(&mut Document)) -> usize {
        let before = self.events.borrow().storage_changes().len();
        f(&mut self.doc);
        self.events.borrow().storage_changes().len() - before
    }

    /// Apply scripted ops in order. Ops naming an unknown zone index are skipped.
    pub fn apply(&mut self, ops: &[Op]) {
        for op in ops {
            self.apply_one(op);
        }
    }

    fn apply_one(&mut self, op: &Op) {
        match op {
            Op::Create { zone_type, title, position } => {
                let id = self.doc.create_zone(*zone_type, Some(title.clone()), Some(*position));
                self.created.push(id);
            }
            Op::Move { zone, position } => {
                if let Some(id) = self.created.get(*zone) {
                    self.doc.move_zone(id, *position);
                }
            }
            Op::Resize { zone, size } => {
                if let Some(id) = self.created.get(*zone) {
                    self.doc.resize_zone(id, *size);
                }
            }
            Op::Rename { zone, title } => {
                if let Some(id) = self.created.get(*zone) {
                    self.doc.set_zone_title(id, title.clone());
                }
            }
            Op::Content { zone, content } => {
                if let Some(id) = self.created.get(*zone) {
                    self.doc.set_zone_content(id, content.clone());
                }
            }
            Op::Delete { zone } => {
                if let Some(id) = self.created.get(*zone) {
                    self.doc.delete_zone(id);
                }
            }
            Op::Restore { zone } => {
                if let Some(id) = self.created.get(*zone) {
                    self.doc.restore_zone(id);
                }
            }
        }
    }
}

impl Default for DocumentHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{GestureTracker, ListenerRegistry};
    use fiche_config::settings::Settings;
    use fiche_config::theme::ThemeSnapshot;

    fn create(title: &str, x: f64, y: f64) -> Op {
        Op::Create { zone_type: ZoneType::Text, title: title.into(), position: Position::new(x, y) }
    }

    #[test]
    fn test_harness_one_notification_per_mutation() {
        let mut harness = DocumentHarness::new();
        harness.apply(&[create("Notes", 50.0, 50.0)]);
        let id = harness.created()[0].clone();

        // Zones and history are two keys, one notification
        assert_eq!(harness.notifications_during(|d| d.move_zone(&id, Position::new(80.0, 80.0))), 1);
        assert_eq!(harness.notifications_during(|d| d.set_zone_content(&id, "x")), 1);
        assert_eq!(harness.notifications_during(|d| { d.undo(); }), 1);
        assert_eq!(harness.notifications_during(|d| { d.redo(); }), 1);

        // No-ops stay silent
        assert_eq!(harness.notifications_during(|d| d.set_zone_content(&id, "x")), 0);
        assert_eq!(harness.notifications_during(|d| d.move_zone("missing", Position::new(1.0, 1.0))), 0);
    }

    #[test]
    fn test_harness_revisions_are_sequential() {
        let mut harness = DocumentHarness::new();
        harness.apply(&[
            create("A", 50.0, 50.0),
            Op::Rename { zone: 0, title: "B".into() },
            Op::Resize { zone: 0, size: Size::new(400.0, 200.0) },
        ]);
        assert_eq!(harness.events().storage_changes(), vec![1, 2, 3]);
        assert_eq!(harness.doc().revision(), 3);
    }

    #[test]
    fn test_harness_theme_undo_broadcasts() {
        let mut harness = DocumentHarness::new();
        harness.doc_mut().set_theme(ThemeSnapshot::builtin("rose"));
        harness.clear_events();

        assert!(harness.doc_mut().undo());
        let events = harness.events();
        assert_eq!(events.theme_restores().len(), 1);
        assert_eq!(events.theme_restores()[0].theme, "purple");
        assert_eq!(events.storage_changes().len(), 1);
    }

    #[test]
    fn test_harness_gesture_drives_document() {
        let mut harness = DocumentHarness::new();
        harness.apply(&[create("Notes", 100.0, 100.0)]);
        let id = harness.created()[0].clone();

        let listeners = ListenerRegistry::new();
        let mut tracker = GestureTracker::new(id.clone(), listeners.clone());
        let doc = harness.doc_mut();
        doc.set_drag_mode(true);

        assert!(tracker.pointer_down(doc, Position::new(110.0, 110.0)));
        assert_eq!(doc.zone(&id).unwrap().z_index, 2);
        tracker.pointer_move(doc, Position::new(250.0, 190.0));
        tracker.pointer_move(doc, Position::new(252.0, 191.0));
        tracker.pointer_up(doc);

        assert_eq!(doc.zone(&id).unwrap().position, Position::new(240.0, 180.0));
        // The whole drag is one move entry
        assert_eq!(doc.history().len(), 2);
        assert_eq!(listeners.active(), 0);

        assert!(tracker.resize_handle_down(doc, Position::new(540.0, 300.0)));
        tracker.pointer_move(doc, Position::new(300.0, 250.0));
        tracker.pointer_up(doc);
        assert_eq!(doc.zone(&id).unwrap().size, Size::new(160.0, 80.0));
        assert_eq!(doc.history().len(), 3);
    }

    #[test]
    fn test_harness_long_drag_is_one_history_entry() {
        let settings = Settings { snap_to_grid: false, ..Settings::default() };
        let mut harness = DocumentHarness::new();
        harness.doc_mut().apply_settings(&settings);
        harness.apply(&[create("Plan", 100.0, 100.0)]);
        let id = harness.created()[0].clone();

        let listeners = ListenerRegistry::new();
        let mut tracker = GestureTracker::new(id.clone(), listeners);
        harness.doc_mut().set_drag_mode(true);
        assert!(tracker.pointer_down(harness.doc_mut(), Position::new(110.0, 110.0)));

        // Every preview is broadcast, none is logged
        let previews = harness.notifications_during(|doc| {
            for i in 1..=150 {
                let step = i as f64 + 0.5;
                tracker.pointer_move(doc, Position::new(110.0 + step, 110.0 + step));
            }
        });
        assert_eq!(previews, 150);
        assert_eq!(harness.doc().history().len(), 1);

        assert_eq!(harness.notifications_during(|doc| tracker.pointer_up(doc)), 1);
        let doc = harness.doc_mut();
        assert_eq!(doc.history().len(), 2);
        assert_eq!(doc.zone(&id).unwrap().position, Position::new(250.5, 250.5));

        assert!(doc.undo());
        assert_eq!(doc.zone(&id).unwrap().position, Position::new(100.0, 100.0));
        assert!(doc.undo());
        assert!(doc.zones().is_empty());
    }
}
