//! # Lockstep Networking
//!
//! The wire envelope and the fixed-step scheduler that drives
//! [`lockstep_core`] in lockstep.
//!
//! ## Architecture
//!
//! - **Protocol**: two-lane envelope over a closed payload set (little-endian)
//! - **Server**: fixed-step accumulator loop, clock, startup context and config
//! - **Transport**: non-blocking hand-off queues to the network side
//! - **Integration**: gameplay hooks invoked from inside the tick
//!
//! ## Guarantees
//!
//! - The tick is single-threaded and never blocks on I/O
//! - No heap allocation inside the tick (the transport may copy frames)
//! - A stop request is honoured only between ticks
//! - Decoding is all-or-nothing
//!
//! ```text
//! NETWORK THREAD                    SIMULATION THREAD
//!   |                                   |
//!   |--- deliver_bytes(input) --------->| apply, integrate, broad-phase
//!   |                                   |
//!   |<-- OutboundFrame(snapshot) -------| every Nth tick
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod integration;
pub mod protocol;
pub mod server;
pub mod transport;

pub use error::{
    ConfigError, ConfigResult, ProtocolError, ProtocolResult, SchedulerError, SchedulerResult,
    TransportError, TransportResult,
};
pub use integration::{GameplayRules, NoopRules};
pub use protocol::{
    decode, encode, encode_into, AdminCommand, AdminMessage, InputMask, InputMessage, Lane,
    Packet, Payload, StateSnapshot,
};
pub use server::{
    Clock, ManualClock, SchedulerState, SchedulerStats, SimConfig, SimContext, StopHandle,
    SystemClock, TickScheduler,
};
pub use transport::{ChannelTransport, Inbound, OutboundFrame, Transport, TransportEndpoint};
