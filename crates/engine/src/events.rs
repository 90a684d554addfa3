//! Change notifications emitted by the persisted state.
//!
//! Listeners never receive the changed data. A `StorageChanged` event means
//! "re-read whatever you display from storage"; replayed undo/redo writes
//! bypass every in-memory cache, so trusting a cache after this event is a bug.

use fiche_config::theme::ThemeSnapshot;

/// Events broadcast to collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// One logical mutation finished writing. Exactly one per mutation,
    /// regardless of how many keys it touched.
    StorageChanged { revision: u64 },

    /// History replay asks the theme collaborator to apply a snapshot.
    ThemeRestore(ThemeSnapshot),
}

/// Callback type for receiving store events.
pub type EventCallback = Box<dyn FnMut(&StoreEvent)>;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Synchronous fan-out to registered listeners, in subscription order.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, EventCallback)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: EventCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, callback));
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &StoreEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Simple event collector for testing.
#[derive(Default)]
pub struct EventCollector {
    events: Vec<StoreEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: StoreEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[StoreEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Revisions of the StorageChanged events, in order.
    pub fn storage_changes(&self) -> Vec<u64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                StoreEvent::StorageChanged { revision } => Some(*revision),
                _ => None,
            })
            .collect()
    }

    /// Filter to only ThemeRestore events.
    pub fn theme_restores(&self) -> Vec<&ThemeSnapshot> {
        self.events
            .iter()
            .filter_map(|e| match e {
                StoreEvent::ThemeRestore(snapshot) => Some(snapshot),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_event_collector_filtering() {
        let mut collector = EventCollector::new();

        collector.push(StoreEvent::StorageChanged { revision: 1 });
        collector.push(StoreEvent::ThemeRestore(ThemeSnapshot::builtin("dark")));
        collector.push(StoreEvent::StorageChanged { revision: 2 });

        assert_eq!(collector.len(), 3);
        assert_eq!(collector.storage_changes(), vec![1, 2]);
        assert_eq!(collector.theme_restores()[0].theme, "dark");
    }

    #[test]
    fn test_bus_subscribe_unsubscribe() {
        let seen = Rc::new(RefCell::new(EventCollector::new()));
        let mut bus = EventBus::new();

        let sink = Rc::clone(&seen);
        let id = bus.subscribe(Box::new(move |e| sink.borrow_mut().push(e.clone())));

        bus.emit(&StoreEvent::StorageChanged { revision: 7 });
        assert_eq!(seen.borrow().storage_changes(), vec![7]);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&StoreEvent::StorageChanged { revision: 8 });
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(bus.listener_count(), 0);
    }
}
