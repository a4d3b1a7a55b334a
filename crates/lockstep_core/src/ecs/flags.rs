//! Per-slot entity flags.

use bitflags::bitflags;

bitflags! {
    /// Bitmask stored per slot. `ACTIVE` is owned by the store; the rest
    /// classify the entity for gameplay rules and snapshots.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EntityFlags: u8 {
        /// Slot holds a live entity.
        const ACTIVE = 1 << 0;
        /// Player-controlled entity.
        const PLAYER = 1 << 1;
        /// Projectile.
        const BULLET = 1 << 2;
        /// Hostile NPC.
        const ENEMY = 1 << 3;
    }
}

impl EntityFlags {
    /// Returns the classification bits with `ACTIVE` stripped.
    ///
    /// This is the `type` column of a snapshot record.
    #[inline]
    #[must_use]
    pub fn kind(self) -> u8 {
        (self - Self::ACTIVE).bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strips_active() {
        let flags = EntityFlags::ACTIVE | EntityFlags::BULLET;
        assert_eq!(flags.kind(), EntityFlags::BULLET.bits());
        assert_eq!(EntityFlags::ACTIVE.kind(), 0);
    }
}
