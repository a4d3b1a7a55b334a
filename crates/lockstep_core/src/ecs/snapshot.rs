//! Packed per-entity snapshot records.

use bytemuck::{Pod, Zeroable};

use super::flags::EntityFlags;
use super::handle::Handle;

/// One `(id, x, y, type)` row of a state snapshot.
///
/// All four columns are `f32` so the record array is a flat float buffer.
/// `id` carries the handle's 32 bits as the float's bit pattern, which keeps
/// it exact; never do arithmetic on it.
///
/// Size: 16 bytes
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
#[repr(C)]
pub struct SnapshotRecord {
    /// Handle bits, reinterpreted as `f32`.
    pub id: f32,
    /// Position X.
    pub x: f32,
    /// Position Y.
    pub y: f32,
    /// Classification bits (flags without `ACTIVE`) as a float.
    pub kind: f32,
}

impl SnapshotRecord {
    /// Size in bytes.
    pub const SIZE: usize = 16;

    /// Builds a record for `handle` at `(x, y)`.
    #[inline]
    #[must_use]
    pub fn new(handle: Handle, x: f32, y: f32, flags: EntityFlags) -> Self {
        Self {
            id: f32::from_bits(handle.raw()),
            x,
            y,
            kind: f32::from(flags.kind()),
        }
    }

    /// Recovers the handle from the `id` column.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> Handle {
        Handle::from_raw(self.id.to_bits())
    }
}

/// Bitwise equality: two records are equal when they encode to the same bytes.
impl PartialEq for SnapshotRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id.to_bits() == other.id.to_bits()
            && self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.kind.to_bits() == other.kind.to_bits()
    }
}

impl Eq for SnapshotRecord {}
