//! Undo/redo and history queries on [`Document`].

use crate::document::Document;
use crate::history::{HistoryAction, HistoryLedger, HistorySummary};

impl Document {
    /// Undo the last applied action. Returns false if there was nothing to
    /// undo or the replay failed; the document is unchanged in both cases.
    pub fn undo(&mut self) -> bool {
        let applied = self.ledger.undo(&mut self.state);
        self.after_replay(applied)
    }

    /// Re-apply the next undone action.
    pub fn redo(&mut self) -> bool {
        let applied = self.ledger.redo(&mut self.state);
        self.after_replay(applied)
    }

    fn after_replay(&mut self, applied: bool) -> bool {
        if applied {
            self.persist_history();
            // Replay wrote storage behind the caches
            self.reload();
        }
        self.finish();
        applied
    }

    pub fn can_undo(&self) -> bool {
        self.ledger.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.ledger.can_redo()
    }

    pub fn history(&self) -> &[HistoryAction] {
        self.ledger.entries()
    }

    pub fn history_ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    pub fn history_summary(&self) -> HistorySummary {
        self.ledger.summary()
    }

    /// Forget every action. The document itself is untouched.
    pub fn clear_history(&mut self) {
        if self.ledger.is_empty() {
            return;
        }
        self.ledger.clear();
        self.persist_history();
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::ZoneType;
    use fiche_core::Position;

    #[test]
    fn test_undo_redo_on_empty_document() {
        let mut doc = Document::in_memory();
        assert!(!doc.undo());
        assert!(!doc.redo());
        assert_eq!(doc.revision(), 0);
    }

    #[test]
    fn test_undo_refreshes_caches() {
        let mut doc = Document::in_memory();
        let id = doc.create_zone(ZoneType::Text, Some("Notes".into()), Some(Position::new(50.0, 50.0)));
        doc.move_zone(&id, Position::new(200.0, 100.0));

        assert!(doc.undo());
        assert_eq!(doc.zone(&id).unwrap().position, Position::new(50.0, 50.0));
        assert!(!doc.is_stale());
        assert!(doc.can_redo());
    }

    #[test]
    fn test_random_position_survives_replay_exactly() {
        for seed in 0..64 {
            let mut doc = Document::in_memory().with_seed(seed);
            let id = doc.create_zone(ZoneType::Text, None, None);
            let placed = doc.zone(&id).unwrap().position;

            assert!(doc.undo());
            assert!(doc.redo());
            let replayed = doc.zone(&id).unwrap().position;
            assert_eq!(replayed.x.to_bits(), placed.x.to_bits(), "seed {seed}");
            assert_eq!(replayed.y.to_bits(), placed.y.to_bits(), "seed {seed}");
        }
    }

    #[test]
    fn test_clear_history() {
        let mut doc = Document::in_memory();
        doc.set_sheet_field("auteur", "Balzac");
        doc.clear_history();
        assert!(doc.history().is_empty());
        assert!(!doc.can_undo());
        assert_eq!(doc.sheet().field("auteur"), "Balzac");
        assert_eq!(doc.history_summary().total_actions, 0);
    }
}
