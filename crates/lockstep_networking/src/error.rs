//! # Error Types
//!
//! All errors raised by the envelope, transport boundary, configuration and
//! scheduler.

use std::path::PathBuf;

use thiserror::Error;

use crate::protocol::PayloadType;
use crate::server::SchedulerState;

/// Envelope decode/encode failures.
///
/// A failed decode yields no packet at all; nothing partially decoded is
/// ever handed on.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// The buffer ends before the header or payload does.
    #[error("truncated packet: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required to finish reading.
        needed: usize,
        /// Bytes in the buffer.
        available: usize,
    },

    /// Payload discriminator outside the closed set.
    #[error("unknown payload type: {0}")]
    UnknownPayloadType(u8),

    /// Lane id other than reliable/unreliable.
    #[error("unknown lane: {0}")]
    UnknownLane(u8),

    /// Admin command id outside the closed set.
    #[error("unknown admin command: {0}")]
    UnknownAdminCommand(u8),

    /// Bytes left over after a complete packet.
    #[error("{0} trailing bytes after packet")]
    TrailingBytes(usize),

    /// Snapshot record count above the supported maximum.
    #[error("snapshot carries {0} records, above the supported maximum")]
    TooManyRecords(usize),
}

/// Result type for envelope operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Failures at the transport hand-off queues.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The bounded queue has no room; the message was not enqueued.
    #[error("transport queue full")]
    QueueFull,

    /// The other side of the queue was dropped.
    #[error("transport disconnected")]
    Disconnected,

    /// Raw bytes did not decode into an inbound message.
    #[error("decode failed: {0}")]
    Decode(#[from] ProtocolError),

    /// The packet decoded but its payload is not accepted in this direction.
    #[error("unexpected {0:?} payload")]
    UnexpectedPayload(PayloadType),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Configuration load/validation failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`crate::SimConfig`].
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its allowed range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Scheduler lifecycle misuse.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// `start` was called on a scheduler that already ran.
    #[error("scheduler is {0:?}, expected Idle")]
    NotIdle(SchedulerState),
}

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
