//! Per-zone drag/resize state machine.
//!
//! A gesture previews every pointer move on the canvas without touching
//! history, then commits once on pointer-up: one drag is one `move` entry,
//! one resize is one `resize` entry. While a gesture is in progress it holds
//! a [`ListenerGuard`] on the canvas-wide pointer listeners; the guard is
//! released on pointer-up and, if the tracker is dropped mid-gesture, by its
//! destructor. A dropped tracker commits nothing.

use std::cell::Cell;
use std::rc::Rc;

use fiche_core::{Bounds, Position, Size};

use crate::placement::PlacementPolicy;
use crate::zone::MIN_ZONE_SIZE;

/// What the tracker needs from the canvas it drives.
pub trait ZoneCanvas {
    /// Global drag-mode toggle. Outside drag mode clicks only select.
    fn drag_mode(&self) -> bool;
    fn selected_zone(&self) -> Option<&str>;
    fn zone_bounds(&self, zone_id: &str) -> Option<Bounds>;
    fn container_size(&self) -> Size;
    fn placement(&self) -> PlacementPolicy;

    fn select_zone(&mut self, zone_id: &str);
    fn bring_to_front(&mut self, zone_id: &str);
    /// Live position while dragging. Not logged.
    fn preview_move(&mut self, zone_id: &str, position: Position);
    /// Live size while resizing. Not logged.
    fn preview_resize(&mut self, zone_id: &str, size: Size);
    /// Gesture ended. Log whatever changed since `start`.
    fn commit_gesture(&mut self, zone_id: &str, start: Bounds);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    /// Pointer offset from the zone's top-left at pointer-down
    Dragging { offset: (f64, f64) },
    Resizing { start_pointer: Position, start_size: Size },
}

/// Counts the canvas-wide pointer listeners currently installed.
///
/// Clones share the same count.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    active: Rc<Cell<usize>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the move/up listeners for one gesture
    pub fn acquire(&self) -> ListenerGuard {
        self.active.set(self.active.get() + 1);
        ListenerGuard { active: Rc::clone(&self.active) }
    }

    pub fn active(&self) -> usize {
        self.active.get()
    }
}

/// Listeners held by one gesture. Dropping it uninstalls them.
#[derive(Debug)]
pub struct ListenerGuard {
    active: Rc<Cell<usize>>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.active.set(self.active.get().saturating_sub(1));
    }
}

#[derive(Debug)]
pub struct GestureTracker {
    zone_id: String,
    state: GestureState,
    listeners: ListenerRegistry,
    guard: Option<ListenerGuard>,
    /// Zone bounds at pointer-down
    start: Option<Bounds>,
}

impl GestureTracker {
    pub fn new(zone_id: impl Into<String>, listeners: ListenerRegistry) -> Self {
        Self {
            zone_id: zone_id.into(),
            state: GestureState::Idle,
            listeners,
            guard: None,
            start: None,
        }
    }

    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != GestureState::Idle
    }

    /// Pointer pressed inside the zone body. Returns true if a drag started.
    pub fn pointer_down<C: ZoneCanvas + ?Sized>(&mut self, canvas: &mut C, pointer: Position) -> bool {
        if self.is_active() {
            return false;
        }
        if !canvas.drag_mode() {
            canvas.select_zone(&self.zone_id);
            return false;
        }
        let Some(bounds) = canvas.zone_bounds(&self.zone_id) else {
            return false;
        };

        self.begin(GestureState::Dragging { offset: pointer.delta_from(bounds.origin) }, bounds);
        canvas.select_zone(&self.zone_id);
        canvas.bring_to_front(&self.zone_id);
        true
    }

    /// Pointer pressed on the resize handle. The handle only exists on the
    /// selected zone in drag mode.
    pub fn resize_handle_down<C: ZoneCanvas + ?Sized>(&mut self, canvas: &mut C, pointer: Position) -> bool {
        if self.is_active() || !canvas.drag_mode() || canvas.selected_zone() != Some(self.zone_id.as_str()) {
            return false;
        }
        let Some(bounds) = canvas.zone_bounds(&self.zone_id) else {
            return false;
        };

        self.begin(GestureState::Resizing { start_pointer: pointer, start_size: bounds.size }, bounds);
        true
    }

    pub fn pointer_move<C: ZoneCanvas + ?Sized>(&mut self, canvas: &mut C, pointer: Position) {
        let policy = canvas.placement();
        match self.state {
            GestureState::Idle => {}
            GestureState::Dragging { offset } => {
                let Some(bounds) = canvas.zone_bounds(&self.zone_id) else {
                    log::debug!("zone {} vanished mid-drag", self.zone_id);
                    self.finish();
                    return;
                };
                let raw = pointer.offset(-offset.0, -offset.1);
                let target = policy.drag_target(raw, bounds.size, canvas.container_size());
                canvas.preview_move(&self.zone_id, target);
            }
            GestureState::Resizing { start_pointer, start_size } => {
                if canvas.zone_bounds(&self.zone_id).is_none() {
                    log::debug!("zone {} vanished mid-resize", self.zone_id);
                    self.finish();
                    return;
                }
                let (dx, dy) = pointer.delta_from(start_pointer);
                let raw = Size::new(
                    (start_size.width + dx).max(MIN_ZONE_SIZE.width),
                    (start_size.height + dy).max(MIN_ZONE_SIZE.height),
                );
                canvas.preview_resize(&self.zone_id, policy.snap_size(raw));
            }
        }
    }

    /// Pointer released anywhere. Commits the gesture and returns to idle.
    pub fn pointer_up<C: ZoneCanvas + ?Sized>(&mut self, canvas: &mut C) {
        if let Some(start) = self.start {
            canvas.commit_gesture(&self.zone_id, start);
        }
        self.finish();
    }

    fn begin(&mut self, state: GestureState, start: Bounds) {
        self.state = state;
        self.start = Some(start);
        self.guard = Some(self.listeners.acquire());
    }

    fn finish(&mut self) {
        self.state = GestureState::Idle;
        self.start = None;
        self.guard = None;
    }
}
