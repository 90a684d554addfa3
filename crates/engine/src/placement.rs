//! Geometry policy for zones: initial placement, grid snapping, the size
//! floor and drag containment.
//!
//! Everything here is a pure function of its inputs. Nothing in this module
//! touches the zone store; callers feed the corrected targets to
//! `move_zone`/`resize_zone`.

use fiche_config::settings::{Settings, DEFAULT_GRID_SIZE};
use fiche_core::{Bounds, Position, Size};
use rand::Rng;

use crate::zone::{DEFAULT_ZONE_SIZE, MIN_ZONE_SIZE};

/// Random candidates tried before giving up on a collision-free spot
pub const PLACEMENT_ATTEMPTS: usize = 10;

/// Distance kept from the top-left edge of the container
pub const PLACEMENT_MARGIN: f64 = 50.0;

/// Room kept free to the right of / below a candidate, on top of the footprint
const PLACEMENT_TRAILING: f64 = 50.0;

/// Snap a single value to the nearest multiple of `grid`.
///
/// A non-positive grid leaves the value untouched.
pub fn snap(value: f64, grid: f64) -> f64 {
    if grid <= 0.0 {
        return value;
    }
    (value / grid).round() * grid
}

/// Clamp a size to the minimum zone footprint.
pub fn floor_size(size: Size) -> Size {
    Size::new(size.width.max(MIN_ZONE_SIZE.width), size.height.max(MIN_ZONE_SIZE.height))
}

/// Canvas placement rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementPolicy {
    pub grid_size: f64,
    pub snap_to_grid: bool,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            snap_to_grid: true,
        }
    }
}

impl PlacementPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            grid_size: settings.grid_size,
            snap_to_grid: settings.snap_to_grid,
        }
    }

    pub fn snap_position(&self, position: Position) -> Position {
        if !self.snap_to_grid {
            return position;
        }
        Position::new(snap(position.x, self.grid_size), snap(position.y, self.grid_size))
    }

    pub fn snap_size(&self, size: Size) -> Size {
        if !self.snap_to_grid {
            return size;
        }
        Size::new(snap(size.width, self.grid_size), snap(size.height, self.grid_size))
    }

    /// Keep a zone of `size` fully inside the container
    pub fn contain(&self, position: Position, size: Size, container: Size) -> Position {
        let max_x = (container.width - size.width).max(0.0);
        let max_y = (container.height - size.height).max(0.0);
        Position::new(position.x.clamp(0.0, max_x), position.y.clamp(0.0, max_y))
    }

    /// Drag target: containment first, then snapping
    pub fn drag_target(&self, position: Position, size: Size, container: Size) -> Position {
        self.snap_position(self.contain(position, size, container))
    }

    /// Resize target: floor first, then snapping
    pub fn resize_target(&self, size: Size) -> Size {
        self.snap_size(floor_size(size))
    }

    /// Pick a spot for a new default-sized zone.
    ///
    /// Tries [`PLACEMENT_ATTEMPTS`] random candidates and returns the first
    /// one whose footprint overlaps none of `occupied`. When every candidate
    /// collides the last one is returned anyway.
    pub fn initial_position<R: Rng + ?Sized>(&self, container: Size, occupied: &[Bounds], rng: &mut R) -> Position {
        let max_x = (container.width - DEFAULT_ZONE_SIZE.width - PLACEMENT_TRAILING).max(PLACEMENT_MARGIN);
        let max_y = (container.height - DEFAULT_ZONE_SIZE.height - PLACEMENT_TRAILING).max(PLACEMENT_MARGIN);

        let mut candidate = Position::new(PLACEMENT_MARGIN, PLACEMENT_MARGIN);
        for attempt in 0..PLACEMENT_ATTEMPTS {
            let raw = Position::new(
                rng.gen_range(PLACEMENT_MARGIN..=max_x),
                rng.gen_range(PLACEMENT_MARGIN..=max_y),
            );
            candidate = self.snap_position(raw);
            let footprint = Bounds::new(candidate, DEFAULT_ZONE_SIZE);
            if !occupied.iter().any(|b| b.overlaps(&footprint)) {
                log::debug!("placed new zone at ({}, {}) after {} attempt(s)", candidate.x, candidate.y, attempt + 1);
                return candidate;
            }
        }
        log::debug!("no free spot after {} attempts, overlapping at ({}, {})", PLACEMENT_ATTEMPTS, candidate.x, candidate.y);
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_snap() {
        assert_eq!(snap(37.0, 20.0), 40.0);
        assert_eq!(snap(53.0, 20.0), 60.0);
        assert_eq!(snap(40.0, 20.0), 40.0);
        assert_eq!(snap(9.0, 20.0), 0.0);
        assert_eq!(snap(13.0, 0.0), 13.0);
    }

    #[test]
    fn test_snap_disabled() {
        let policy = PlacementPolicy { snap_to_grid: false, ..Default::default() };
        let p = Position::new(37.0, 53.0);
        assert_eq!(policy.snap_position(p), p);
    }

    #[test]
    fn test_floor_before_snap() {
        let policy = PlacementPolicy::default();
        assert_eq!(policy.resize_target(Size::new(10.0, 5.0)), Size::new(160.0, 80.0));
        assert_eq!(policy.resize_target(Size::new(305.0, 129.0)), Size::new(300.0, 120.0));
    }

    #[test]
    fn test_contain() {
        let policy = PlacementPolicy::default();
        let container = Size::new(1000.0, 600.0);
        let p = policy.contain(Position::new(-30.0, 900.0), DEFAULT_ZONE_SIZE, container);
        assert_eq!(p, Position::new(0.0, 480.0));

        // Container smaller than the zone pins it to the origin
        let tiny = policy.contain(Position::new(10.0, 10.0), DEFAULT_ZONE_SIZE, Size::new(100.0, 100.0));
        assert_eq!(tiny, Position::new(0.0, 0.0));
    }

    #[test]
    fn test_initial_position_stays_in_range() {
        let policy = PlacementPolicy { snap_to_grid: false, ..Default::default() };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let p = policy.initial_position(Size::new(1000.0, 800.0), &[], &mut rng);
            assert!((50.0..=650.0).contains(&p.x));
            assert!((50.0..=630.0).contains(&p.y));
        }
    }

    #[test]
    fn test_initial_position_small_container() {
        let policy = PlacementPolicy::default();
        let mut rng = StdRng::seed_from_u64(1);
        let p = policy.initial_position(Size::new(200.0, 100.0), &[], &mut rng);
        assert_eq!(p, Position::new(60.0, 60.0));
    }
}
