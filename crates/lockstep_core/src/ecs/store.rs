//! # Entity Store
//!
//! Fixed-capacity structure-of-arrays storage.
//!
//! Every component lives in its own contiguous array indexed by slot.
//! Slots are recycled LIFO through a [`SlotStack`]; each recycle bumps the
//! slot's generation so handles issued earlier stop resolving.

use tracing::info;

use super::flags::EntityFlags;
use super::handle::{next_generation, Handle};
use super::snapshot::SnapshotRecord;
use crate::batch;
use crate::error::{EntityError, EntityResult};
use crate::memory::SlotStack;

/// The entity store - owns all per-entity simulation state.
///
/// All memory is allocated in [`EntityStore::new`]. Spawn, despawn and
/// integrate never touch the heap.
///
/// # Example
///
/// ```rust
/// use lockstep_core::{EntityError, EntityFlags, EntityStore};
///
/// let mut store = EntityStore::new(1);
/// let h = store.spawn(0.0, 0.0, 1.0, 0.0, EntityFlags::BULLET).unwrap();
/// assert!(matches!(store.spawn(0.0, 0.0, 0.0, 0.0, EntityFlags::empty()), Err(EntityError::Full { .. })));
///
/// store.despawn(h).unwrap();
/// assert!(!store.is_active(h));
/// ```
pub struct EntityStore {
    /// Currently issued handle per slot (generation-tagged).
    handles: Box<[Handle]>,
    /// Flags per slot; `ACTIVE` marks a live entity.
    flags: Box<[EntityFlags]>,
    pos_x: Box<[f32]>,
    pos_y: Box<[f32]>,
    vel_x: Box<[f32]>,
    vel_y: Box<[f32]>,
    /// Collision radius.
    radius: Box<[f32]>,
    /// Owning entity/session id (e.g. who fired a bullet).
    owner: Box<[u32]>,
    /// Input bitmask applied this tick.
    input: Box<[u8]>,
    /// Recyclable slots.
    free: SlotStack,
    /// Slots `[0, high_water)` have been handed out at least once.
    high_water: usize,
    /// Number of live entities.
    live: usize,
}

impl EntityStore {
    /// Largest supported capacity: indices must fit the handle's 16 bits.
    pub const MAX_CAPACITY: usize = 1 << 16;

    /// Creates a store with room for `capacity` entities.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero or exceeds [`Self::MAX_CAPACITY`].
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            capacity <= Self::MAX_CAPACITY,
            "Capacity cannot exceed {}",
            Self::MAX_CAPACITY
        );

        info!(capacity, "entity store initialized");

        Self {
            handles: vec![Handle::INVALID; capacity].into_boxed_slice(),
            flags: vec![EntityFlags::empty(); capacity].into_boxed_slice(),
            pos_x: vec![0.0; capacity].into_boxed_slice(),
            pos_y: vec![0.0; capacity].into_boxed_slice(),
            vel_x: vec![0.0; capacity].into_boxed_slice(),
            vel_y: vec![0.0; capacity].into_boxed_slice(),
            radius: vec![0.0; capacity].into_boxed_slice(),
            owner: vec![0; capacity].into_boxed_slice(),
            input: vec![0; capacity].into_boxed_slice(),
            free: SlotStack::with_capacity(capacity),
            high_water: 0,
            live: 0,
        }
    }

    /// Returns the fixed capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.handles.len()
    }

    /// Returns the number of live entities.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live
    }

    /// Returns one past the highest slot ever handed out.
    #[inline]
    #[must_use]
    pub const fn high_water(&self) -> usize {
        self.high_water
    }

    /// Spawns an entity, reusing the most recently freed slot if any.
    ///
    /// The slot's components are reset: position and velocity take the given
    /// values; radius, owner and input are zeroed. `ACTIVE` is always set.
    ///
    /// # Errors
    ///
    /// [`EntityError::Full`] once every slot holds a live entity.
    pub fn spawn(&mut self, x: f32, y: f32, vx: f32, vy: f32, flags: EntityFlags) -> EntityResult<Handle> {
        let slot = if let Some(index) = self.free.pop() {
            usize::from(index)
        } else if self.high_water < self.capacity() {
            self.high_water += 1;
            self.high_water - 1
        } else {
            return Err(EntityError::Full {
                capacity: self.capacity(),
            });
        };

        // Never-used slots hold generation 0, so they start at 1.
        let generation = next_generation(self.handles[slot].generation());
        #[allow(clippy::cast_possible_truncation)]
        let handle = Handle::new(slot as u16, generation);

        self.handles[slot] = handle;
        self.flags[slot] = flags | EntityFlags::ACTIVE;
        self.pos_x[slot] = x;
        self.pos_y[slot] = y;
        self.vel_x[slot] = vx;
        self.vel_y[slot] = vy;
        self.radius[slot] = 0.0;
        self.owner[slot] = 0;
        self.input[slot] = 0;
        self.live += 1;

        Ok(handle)
    }

    /// Despawns the entity behind `handle` and recycles its slot.
    ///
    /// Every handle previously issued for the slot stops resolving at once.
    ///
    /// # Errors
    ///
    /// - [`EntityError::OutOfRange`] if the index is beyond capacity.
    /// - [`EntityError::StaleHandle`] if the slot's generation differs, or the
    ///   slot was already freed.
    pub fn despawn(&mut self, handle: Handle) -> EntityResult<()> {
        let slot = self.check(handle)?;

        self.flags[slot] = EntityFlags::empty();
        self.live -= 1;

        // At most `capacity` slots are ever free at once.
        let pushed = self.free.push(handle.index());
        debug_assert!(pushed, "free list overflow");

        Ok(())
    }

    /// Returns true if `handle` refers to a live entity. Never fails.
    #[inline]
    #[must_use]
    pub fn is_active(&self, handle: Handle) -> bool {
        self.check(handle).is_ok()
    }

    /// Returns the slot index of a live handle.
    #[inline]
    #[must_use]
    pub fn resolve(&self, handle: Handle) -> Option<usize> {
        self.check(handle).ok()
    }

    fn check(&self, handle: Handle) -> EntityResult<usize> {
        let slot = usize::from(handle.index());
        if slot >= self.capacity() {
            return Err(EntityError::OutOfRange {
                index: slot,
                capacity: self.capacity(),
            });
        }
        if handle.is_invalid()
            || self.handles[slot] != handle
            || !self.flags[slot].contains(EntityFlags::ACTIVE)
        {
            return Err(EntityError::StaleHandle { handle });
        }
        Ok(slot)
    }

    /// Advances every live entity: `position += velocity * dt`.
    ///
    /// Runs of consecutive live slots go through [`batch::integrate`]; free
    /// slots are skipped by flag alone. Zero allocations.
    pub fn integrate(&mut self, dt: f32) {
        let end = self.high_water;
        let mut slot = 0;

        while slot < end {
            if !self.flags[slot].contains(EntityFlags::ACTIVE) {
                slot += 1;
                continue;
            }

            let start = slot;
            while slot < end && self.flags[slot].contains(EntityFlags::ACTIVE) {
                slot += 1;
            }

            batch::integrate(&mut self.pos_x[start..slot], &self.vel_x[start..slot], dt);
            batch::integrate(&mut self.pos_y[start..slot], &self.vel_y[start..slot], dt);
        }
    }

    /// Iterates over the slot indices of live entities, in slot order.
    pub fn active_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags[..self.high_water]
            .iter()
            .enumerate()
            .filter(|(_, flags)| flags.contains(EntityFlags::ACTIVE))
            .map(|(slot, _)| slot)
    }

    /// Replaces the contents of `records` with one row per live entity.
    ///
    /// Does not reallocate when `records` already has [`Self::capacity`]
    /// rows reserved.
    pub fn fill_snapshot(&self, records: &mut Vec<SnapshotRecord>) {
        records.clear();
        for slot in self.active_slots() {
            records.push(SnapshotRecord::new(
                self.handles[slot],
                self.pos_x[slot],
                self.pos_y[slot],
                self.flags[slot],
            ));
        }
    }

    // =========================================================================
    // Per-slot access. Slots past capacity panic like slice indexing.
    // =========================================================================

    /// Returns true if `slot` currently holds a live entity.
    #[inline]
    #[must_use]
    pub fn is_slot_active(&self, slot: usize) -> bool {
        self.flags
            .get(slot)
            .is_some_and(|flags| flags.contains(EntityFlags::ACTIVE))
    }

    /// Returns the handle currently issued for `slot`.
    #[inline]
    #[must_use]
    pub fn handle_at(&self, slot: usize) -> Handle {
        self.handles[slot]
    }

    /// Returns the flags of `slot`.
    #[inline]
    #[must_use]
    pub fn flags(&self, slot: usize) -> EntityFlags {
        self.flags[slot]
    }

    /// Returns the position of `slot`.
    #[inline]
    #[must_use]
    pub fn position(&self, slot: usize) -> (f32, f32) {
        (self.pos_x[slot], self.pos_y[slot])
    }

    /// Overwrites the position of `slot`.
    #[inline]
    pub fn set_position(&mut self, slot: usize, x: f32, y: f32) {
        self.pos_x[slot] = x;
        self.pos_y[slot] = y;
    }

    /// Returns the velocity of `slot`.
    #[inline]
    #[must_use]
    pub fn velocity(&self, slot: usize) -> (f32, f32) {
        (self.vel_x[slot], self.vel_y[slot])
    }

    /// Overwrites the velocity of `slot`.
    #[inline]
    pub fn set_velocity(&mut self, slot: usize, vx: f32, vy: f32) {
        self.vel_x[slot] = vx;
        self.vel_y[slot] = vy;
    }

    /// Returns the collision radius of `slot`.
    #[inline]
    #[must_use]
    pub fn radius(&self, slot: usize) -> f32 {
        self.radius[slot]
    }

    /// Sets the collision radius of `slot`.
    #[inline]
    pub fn set_radius(&mut self, slot: usize, radius: f32) {
        self.radius[slot] = radius;
    }

    /// Returns the owner id of `slot`.
    #[inline]
    #[must_use]
    pub fn owner(&self, slot: usize) -> u32 {
        self.owner[slot]
    }

    /// Sets the owner id of `slot`.
    #[inline]
    pub fn set_owner(&mut self, slot: usize, owner: u32) {
        self.owner[slot] = owner;
    }

    /// Returns the input bitmask of `slot`.
    #[inline]
    #[must_use]
    pub fn input_mask(&self, slot: usize) -> u8 {
        self.input[slot]
    }

    /// Sets the input bitmask of `slot`.
    #[inline]
    pub fn set_input_mask(&mut self, slot: usize, mask: u8) {
        self.input[slot] = mask;
    }

    /// X positions of all slots (live or not).
    #[inline]
    #[must_use]
    pub fn positions_x(&self) -> &[f32] {
        &self.pos_x
    }

    /// Y positions of all slots (live or not).
    #[inline]
    #[must_use]
    pub fn positions_y(&self) -> &[f32] {
        &self.pos_y
    }
}
