//! # Lane Sequencing
//!
//! Sender-side numbering and receiver-side loss/reorder detection.
//!
//! The envelope never retransmits or reorders. These types only number
//! packets and report what the receiver observed.

use super::packets::Lane;

/// Assigns monotonic sequence numbers, independently per lane.
///
/// Each lane starts at 0.
#[derive(Clone, Debug, Default)]
pub struct LaneSequencer {
    next: [u64; Lane::COUNT],
}

impl LaneSequencer {
    /// Creates a sequencer with every lane at 0.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: [0; Lane::COUNT],
        }
    }

    /// Returns the sequence for the next packet on `lane` and advances it.
    #[inline]
    pub fn next(&mut self, lane: Lane) -> u64 {
        let slot = &mut self.next[lane.index()];
        let sequence = *slot;
        *slot = slot.wrapping_add(1);
        sequence
    }

    /// Returns the sequence the next packet on `lane` will get.
    #[inline]
    #[must_use]
    pub const fn peek(&self, lane: Lane) -> u64 {
        self.next[lane.index()]
    }
}

/// What a received sequence number says about the lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceStatus {
    /// Exactly the next expected number.
    InOrder,
    /// Newer than expected; `missing` packets were skipped.
    Gap {
        /// Number of sequence numbers skipped.
        missing: u64,
    },
    /// Not newer than the highest seen: duplicate or reordered.
    Stale,
}

#[derive(Clone, Copy, Debug, Default)]
struct LaneState {
    highest: Option<u64>,
    lost: u64,
    stale: u64,
}

/// Receiver-side tracker of the highest sequence seen per lane.
#[derive(Clone, Debug, Default)]
pub struct SequenceTracker {
    lanes: [LaneState; Lane::COUNT],
}

impl SequenceTracker {
    /// Creates a tracker that has seen nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `sequence` on `lane` and classifies it.
    ///
    /// The first packet on a lane is compared against 0, the sender's
    /// starting number.
    pub fn observe(&mut self, lane: Lane, sequence: u64) -> SequenceStatus {
        let state = &mut self.lanes[lane.index()];

        let expected = match state.highest {
            Some(highest) if sequence <= highest => {
                state.stale += 1;
                return SequenceStatus::Stale;
            }
            Some(highest) => highest + 1,
            None => 0,
        };

        state.highest = Some(sequence);
        match sequence - expected {
            0 => SequenceStatus::InOrder,
            missing => {
                state.lost += missing;
                SequenceStatus::Gap { missing }
            }
        }
    }

    /// Highest sequence seen on `lane`.
    #[inline]
    #[must_use]
    pub fn highest(&self, lane: Lane) -> Option<u64> {
        self.lanes[lane.index()].highest
    }

    /// Total sequence numbers skipped on `lane`.
    #[inline]
    #[must_use]
    pub fn lost(&self, lane: Lane) -> u64 {
        self.lanes[lane.index()].lost
    }

    /// Total duplicate or out-of-order arrivals on `lane`.
    #[inline]
    #[must_use]
    pub fn stale(&self, lane: Lane) -> u64 {
        self.lanes[lane.index()].stale
    }
}
