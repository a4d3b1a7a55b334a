//! # Entity Storage
//!
//! A zero-allocation structure-of-arrays entity store.
//!
//! ## Design Philosophy
//!
//! - All storage is pre-allocated at store creation; capacity never grows
//! - One dense array per component for cache-friendly integration
//! - Handles are slot indices tagged with a generation counter
//! - Freed slots are recycled LIFO

mod flags;
mod handle;
mod snapshot;
mod store;

pub use flags::EntityFlags;
pub use handle::{next_generation, Handle};
pub use snapshot::SnapshotRecord;
pub use store::EntityStore;
