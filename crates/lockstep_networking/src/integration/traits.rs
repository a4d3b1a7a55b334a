//! # Integration Traits
//!
//! Hooks the integrator implements to put gameplay on top of the tick.
//!
//! ```text
//! Scheduler calls:        Integrator implements:
//! ┌──────────────────┐    ┌────────────────────┐
//! │ apply_input      │ ←─ │ impl GameplayRules │
//! │ resolve_pair     │    └────────────────────┘
//! └──────────────────┘
//! ```

use lockstep_core::EntityStore;

use crate::protocol::InputMessage;

/// Gameplay decisions the scheduler delegates.
///
/// Both hooks run inside a tick, on the simulation thread, with exclusive
/// access to the store.
pub trait GameplayRules {
    /// Applies one input to the live entity in `slot`.
    ///
    /// Called during the input phase, before integration. The default
    /// records the input mask on the entity and nothing else.
    fn apply_input(&mut self, store: &mut EntityStore, slot: usize, input: &InputMessage) {
        store.set_input_mask(slot, input.mask.bits());
    }

    /// Resolves one broad-phase candidate pair.
    ///
    /// Called once per unordered pair of live slots whose cells are
    /// adjacent, with `a < b`. Both slots are live at the time of the call,
    /// even if an earlier call in the same tick despawned something.
    fn resolve_pair(&mut self, store: &mut EntityStore, a: usize, b: usize);
}

/// Rules that apply inputs and ignore every pair.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopRules;

impl GameplayRules for NoopRules {
    #[inline]
    fn resolve_pair(&mut self, _store: &mut EntityStore, _a: usize, _b: usize) {}
}

/// Precise circle-overlap test for a candidate pair, using each slot's
/// collision radius. Touching circles overlap.
#[must_use]
pub fn circles_overlap(store: &EntityStore, a: usize, b: usize) -> bool {
    let (ax, ay) = store.position(a);
    let (bx, by) = store.position(b);
    let reach = store.radius(a) + store.radius(b);
    lockstep_core::batch::scalar::point_in_circle(ax, ay, bx, by, reach * reach)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::InputMask;
    use lockstep_core::EntityFlags;

    #[test]
    fn test_default_apply_input_sets_mask() {
        let mut store = EntityStore::new(2);
        let h = store.spawn(0.0, 0.0, 0.0, 0.0, EntityFlags::PLAYER).unwrap();
        let slot = store.resolve(h).unwrap();

        let mut rules = NoopRules;
        rules.apply_input(
            &mut store,
            slot,
            &InputMessage::new(1, InputMask::RIGHT | InputMask::SHOOT, 0.0),
        );
        assert_eq!(store.input_mask(slot), 0b1_1000);
    }

    #[test]
    fn test_circles_overlap() {
        let mut store = EntityStore::new(3);
        let a = store.spawn(0.0, 0.0, 0.0, 0.0, EntityFlags::PLAYER).unwrap();
        let b = store.spawn(3.0, 4.0, 0.0, 0.0, EntityFlags::BULLET).unwrap();
        let (a, b) = (store.resolve(a).unwrap(), store.resolve(b).unwrap());

        store.set_radius(a, 2.0);
        store.set_radius(b, 2.0);
        assert!(!circles_overlap(&store, a, b));

        store.set_radius(b, 3.0);
        assert!(circles_overlap(&store, a, b));
    }
}
