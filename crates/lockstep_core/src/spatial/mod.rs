//! # Broad-Phase
//!
//! Coarse spatial filtering that precedes precise collision resolution.
//! The index is transient: built from entity positions once per tick and
//! discarded at tick end.

mod grid;

pub use grid::{SpatialIndex, CELL_SIZE};
