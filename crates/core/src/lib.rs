pub mod geometry;

pub use geometry::{Bounds, Position, Size};
