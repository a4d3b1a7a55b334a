//! # Memory Management
//!
//! Fixed-capacity structures sized once at startup so the tick never
//! touches the heap.

mod slot_stack;

pub use slot_stack::SlotStack;
