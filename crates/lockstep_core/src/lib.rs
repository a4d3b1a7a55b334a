//! # Lockstep Core
//!
//! The deterministic simulation kernel driven by the tick scheduler:
//! - A structure-of-arrays entity store with generation-checked handles
//! - A uniform-grid broad-phase index rebuilt from positions every tick
//! - Batched `f32` kernels whose scalar tail is bit-identical to the batch path
//!
//! ## Architecture Rules
//!
//! 1. **No heap allocations in the tick** - all storage is sized at construction
//! 2. **Data-oriented design** - one contiguous array per component
//! 3. **Stale handles are detected** - every slot carries a generation counter
//!
//! ## Example
//!
//! ```rust
//! use lockstep_core::{EntityFlags, EntityStore, SpatialIndex};
//!
//! let mut store = EntityStore::new(128);
//! let player = store.spawn(10.0, 10.0, 1.0, 0.0, EntityFlags::PLAYER).unwrap();
//! store.integrate(1.0 / 60.0);
//!
//! let mut index = SpatialIndex::new(1000.0, 1000.0, store.capacity());
//! index.rebuild(&store);
//!
//! let mut seen = 0;
//! index.query_neighborhood(10.0, 10.0, |_| seen += 1);
//! assert_eq!(seen, 1);
//! assert!(store.is_active(player));
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod batch;
pub mod ecs;
pub mod error;
pub mod memory;
pub mod spatial;

pub use ecs::{EntityFlags, EntityStore, Handle, SnapshotRecord};
pub use error::{EntityError, EntityResult};
pub use memory::SlotStack;
pub use spatial::{SpatialIndex, CELL_SIZE};
