//! # Core Error Types
//!
//! Caller errors raised synchronously by the entity store. None of them are
//! retried internally.

use thiserror::Error;

use crate::ecs::Handle;

/// Errors returned by [`EntityStore`](crate::EntityStore) operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityError {
    /// Every slot is occupied by a live entity.
    #[error("entity store full: capacity {capacity}")]
    Full {
        /// Fixed capacity of the store.
        capacity: usize,
    },

    /// The handle's index lies outside the store.
    #[error("entity index {index} out of range: capacity {capacity}")]
    OutOfRange {
        /// Index carried by the handle.
        index: usize,
        /// Fixed capacity of the store.
        capacity: usize,
    },

    /// The slot was recycled (or freed) after this handle was issued.
    #[error("stale entity handle {handle}")]
    StaleHandle {
        /// The rejected handle.
        handle: Handle,
    },
}

/// Result type for entity store operations.
pub type EntityResult<T> = Result<T, EntityError>;
