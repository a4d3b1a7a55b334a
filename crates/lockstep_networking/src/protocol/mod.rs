//! # Network Protocol
//!
//! The wire envelope: a closed tagged union multiplexed over two lanes.
//!
//! ## Packet Structure
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ Header (10 bytes)                                          │
//! ├────────────────────────────────────────────────────────────┤
//! │ Lane (1) │ Sequence (8) │ PayloadType (1)                  │
//! ├────────────────────────────────────────────────────────────┤
//! │ Payload (Input 13 | Snapshot 12 + 16n | Admin 5)           │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! All multi-byte fields are little-endian.

mod packets;
mod sequence;
mod serialization;

pub use packets::{
    AdminCommand, AdminMessage, InputMask, InputMessage, Lane, Packet, Payload, PayloadType,
    StateSnapshot,
};
pub use sequence::{LaneSequencer, SequenceStatus, SequenceTracker};
pub use serialization::{decode, encode, encode_into, encoded_len};
