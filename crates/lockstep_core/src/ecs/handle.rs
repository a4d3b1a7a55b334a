//! # Entity Handles
//!
//! Handles are lightweight identifiers consisting of:
//! - A 16-bit slot index into the component arrays
//! - A 16-bit generation counter for safe slot reuse

use std::fmt;

/// Generation-tagged reference to an entity slot.
///
/// The 32-bit value is split into two parts:
/// - Lower 16 bits: Index into component arrays
/// - Upper 16 bits: Generation counter for detecting stale references
///
/// Generation 0 is never issued, so any handle carrying it is invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Handle(u32);

impl Handle {
    /// Reserved "no entity" sentinel (generation 0, index 0).
    pub const INVALID: Self = Self(0);

    /// First generation issued for a freshly allocated slot.
    pub const FIRST_GENERATION: u16 = 1;

    /// Creates a handle from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u16, generation: u16) -> Self {
        Self(((generation as u32) << 16) | index as u32)
    }

    /// Reinterprets a raw 32-bit value (e.g. from the wire) as a handle.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw 32-bit value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the slot index portion.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Returns the generation portion.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Returns true if this handle carries the reserved generation 0.
    #[inline]
    #[must_use]
    pub const fn is_invalid(self) -> bool {
        self.generation() == 0
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

/// Returns the generation that follows `generation` when a slot is recycled.
///
/// Wraps from `0xFFFF` back to 1, skipping the reserved 0. `0xFFFF` itself
/// is a valid generation, so a slot cycles through 65 535 generations
/// before a handle can alias.
#[inline]
#[must_use]
pub const fn next_generation(generation: u16) -> u16 {
    match generation.wrapping_add(1) {
        0 => Handle::FIRST_GENERATION,
        next => next,
    }
}
