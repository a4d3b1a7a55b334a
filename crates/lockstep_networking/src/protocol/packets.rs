//! # Packet Definitions
//!
//! The closed set of messages carried by the envelope.
//!
//! Discriminators are fixed integers on the wire and never derived from
//! in-memory layout. Float fields compare bitwise, so a decoded packet is
//! equal to the one that was encoded even when it carries NaN.

use bitflags::bitflags;
use lockstep_core::SnapshotRecord;

/// Logical channel a packet travels on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Lane {
    /// Delivery guaranteed by the transport.
    Reliable = 0,
    /// Best effort; loss is detected through sequence gaps.
    Unreliable = 1,
}

impl Lane {
    /// Number of lanes.
    pub const COUNT: usize = 2;

    /// Parses a wire lane id.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Reliable),
            1 => Some(Self::Unreliable),
            _ => None,
        }
    }

    /// Dense index for per-lane tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Payload discriminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PayloadType {
    /// Client -> Server: one tick of input.
    Input = 0,
    /// Server -> Client: packed entity state.
    StateSnapshot = 1,
    /// Operator -> Server: runtime control.
    Admin = 2,
}

impl PayloadType {
    /// Parses a wire discriminator.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Input),
            1 => Some(Self::StateSnapshot),
            2 => Some(Self::Admin),
            _ => None,
        }
    }
}

bitflags! {
    /// Per-tick input bits.
    ///
    /// Undefined bits are preserved through encode and decode.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct InputMask: u8 {
        /// Move up.
        const UP = 1 << 0;
        /// Move down.
        const DOWN = 1 << 1;
        /// Move left.
        const LEFT = 1 << 2;
        /// Move right.
        const RIGHT = 1 << 3;
        /// Fire.
        const SHOOT = 1 << 4;
    }
}

/// Player input for a single tick.
///
/// Wire size: 13 bytes
#[derive(Clone, Copy, Debug, Default)]
pub struct InputMessage {
    /// Tick this input was produced for.
    pub tick: u64,
    /// Buttons held.
    pub mask: InputMask,
    /// Aim angle in radians.
    pub angle: f32,
}

impl InputMessage {
    /// Payload size in bytes.
    pub const SIZE: usize = 13;

    /// Creates an input message.
    #[inline]
    #[must_use]
    pub const fn new(tick: u64, mask: InputMask, angle: f32) -> Self {
        Self { tick, mask, angle }
    }
}

impl PartialEq for InputMessage {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.mask == other.mask
            && self.angle.to_bits() == other.angle.to_bits()
    }
}

impl Eq for InputMessage {}

/// Full state of every live entity at one server tick.
///
/// Wire size: 12 + 16 * records
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    /// Tick the state was captured after.
    pub server_tick: u64,
    /// One row per live entity, in slot order.
    pub records: Vec<SnapshotRecord>,
}

impl StateSnapshot {
    /// Bytes before the first record (`server_tick` + count).
    pub const PREFIX_SIZE: usize = 12;

    /// Largest record count accepted on either side of the wire.
    pub const MAX_RECORDS: usize = lockstep_core::EntityStore::MAX_CAPACITY;

    /// Creates an empty snapshot with room for `capacity` records.
    #[must_use]
    pub fn with_capacity(server_tick: u64, capacity: usize) -> Self {
        Self {
            server_tick,
            records: Vec::with_capacity(capacity),
        }
    }

    /// Number of records.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.records.len()
    }
}

/// Admin command discriminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AdminCommand {
    /// Change the tick rate to `value` Hz at the next tick boundary.
    SetTickRate = 1,
    /// Send a full snapshot on the reliable lane at the end of the tick.
    ForceResync = 2,
}

impl AdminCommand {
    /// Parses a wire command id.
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::SetTickRate),
            2 => Some(Self::ForceResync),
            _ => None,
        }
    }
}

/// Runtime control message.
///
/// Wire size: 5 bytes
#[derive(Clone, Copy, Debug)]
pub struct AdminMessage {
    /// What to do.
    pub command: AdminCommand,
    /// Command argument; ignored by `ForceResync`.
    pub value: f32,
}

impl AdminMessage {
    /// Payload size in bytes.
    pub const SIZE: usize = 5;

    /// Creates a `SetTickRate` command.
    #[must_use]
    pub const fn set_tick_rate(hz: f32) -> Self {
        Self {
            command: AdminCommand::SetTickRate,
            value: hz,
        }
    }

    /// Creates a `ForceResync` command.
    #[must_use]
    pub const fn force_resync() -> Self {
        Self {
            command: AdminCommand::ForceResync,
            value: 0.0,
        }
    }
}

impl PartialEq for AdminMessage {
    fn eq(&self, other: &Self) -> bool {
        self.command == other.command && self.value.to_bits() == other.value.to_bits()
    }
}

impl Eq for AdminMessage {}

/// Closed payload union.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Player input.
    Input(InputMessage),
    /// Entity state.
    StateSnapshot(StateSnapshot),
    /// Runtime control.
    Admin(AdminMessage),
}

impl Payload {
    /// Wire discriminator of this payload.
    #[inline]
    #[must_use]
    pub const fn payload_type(&self) -> PayloadType {
        match self {
            Self::Input(_) => PayloadType::Input,
            Self::StateSnapshot(_) => PayloadType::StateSnapshot,
            Self::Admin(_) => PayloadType::Admin,
        }
    }
}

/// One unit of I/O: lane, per-lane sequence, payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    /// Lane the packet travels on.
    pub lane: Lane,
    /// Sequence number, monotonic per lane.
    pub sequence: u64,
    /// Message body.
    pub payload: Payload,
}

impl Packet {
    /// Bytes before the payload: lane (1) + sequence (8) + type (1).
    pub const HEADER_SIZE: usize = 10;

    /// Creates a packet.
    #[inline]
    #[must_use]
    pub const fn new(lane: Lane, sequence: u64, payload: Payload) -> Self {
        Self {
            lane,
            sequence,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminators_are_stable() {
        assert_eq!(Lane::Reliable as u8, 0);
        assert_eq!(Lane::Unreliable as u8, 1);
        assert_eq!(PayloadType::Input as u8, 0);
        assert_eq!(PayloadType::StateSnapshot as u8, 1);
        assert_eq!(PayloadType::Admin as u8, 2);
        assert_eq!(AdminCommand::SetTickRate as u8, 1);
        assert_eq!(AdminCommand::ForceResync as u8, 2);
        assert_eq!(InputMask::SHOOT.bits(), 0b1_0000);
    }

    #[test]
    fn test_from_u8_rejects_unknown() {
        assert_eq!(Lane::from_u8(2), None);
        assert_eq!(PayloadType::from_u8(3), None);
        assert_eq!(AdminCommand::from_u8(0), None);
        assert_eq!(AdminCommand::from_u8(3), None);
    }

    #[test]
    fn test_nan_fields_compare_bitwise() {
        let a = InputMessage::new(1, InputMask::UP, f32::NAN);
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, InputMessage::new(1, InputMask::UP, -f32::NAN));
    }
}
