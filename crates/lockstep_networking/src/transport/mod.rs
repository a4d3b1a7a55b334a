//! # Transport Boundary
//!
//! The scheduler's only contact with I/O.
//!
//! ## Contract
//!
//! - `poll_inbound` never blocks; `None` means nothing is queued right now
//! - `broadcast` never blocks; a frame that cannot be queued is dropped
//! - Reliability and ordering belong to whatever sits behind the transport
//!
//! [`ChannelTransport`] is the in-process implementation: two bounded
//! `crossbeam-channel` queues shared with a [`TransportEndpoint`] that
//! network threads (or tests) drive.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use lockstep_core::Handle;
use tracing::{debug, warn, Span};

use crate::error::{TransportError, TransportResult};
use crate::protocol::{decode, AdminMessage, InputMessage, Lane, Payload, PayloadType};
use crate::server::SimContext;

/// A decoded message waiting for the next tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inbound {
    /// Input for the entity behind `entity`.
    Input {
        /// Entity the input drives; may be stale by the time it is applied.
        entity: Handle,
        /// The input itself.
        input: InputMessage,
    },
    /// Operator command.
    Admin(AdminMessage),
}

/// One encoded packet on its way out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundFrame {
    /// Lane the packet was encoded for.
    pub lane: Lane,
    /// Encoded packet.
    pub bytes: Vec<u8>,
}

/// What the scheduler needs from the network side.
pub trait Transport {
    /// Takes the next queued inbound message, if any. Never blocks.
    fn poll_inbound(&mut self) -> Option<Inbound>;

    /// Hands an encoded packet to the network side. Never blocks.
    fn broadcast(&mut self, lane: Lane, frame: &[u8]);
}

/// Scheduler half of an in-process transport.
pub struct ChannelTransport {
    inbound: Receiver<Inbound>,
    outbound: Sender<OutboundFrame>,
    frames_sent: u64,
    frames_dropped: u64,
    span: Span,
}

/// Network half of an in-process transport. Cheap to clone.
#[derive(Clone)]
pub struct TransportEndpoint {
    inbound: Sender<Inbound>,
    outbound: Receiver<OutboundFrame>,
}

impl ChannelTransport {
    /// Creates a connected transport/endpoint pair sized from the context's
    /// queue capacities.
    #[must_use]
    pub fn new(context: &SimContext) -> (Self, TransportEndpoint) {
        let config = context.config();
        Self::with_capacity(
            config.inbound_queue_capacity,
            config.outbound_queue_capacity,
            context.span().clone(),
        )
    }

    /// Creates a connected pair with explicit queue bounds.
    ///
    /// # Panics
    ///
    /// Panics if either capacity is zero.
    #[must_use]
    pub fn with_capacity(
        inbound_capacity: usize,
        outbound_capacity: usize,
        span: Span,
    ) -> (Self, TransportEndpoint) {
        assert!(inbound_capacity > 0, "inbound capacity must be non-zero");
        assert!(outbound_capacity > 0, "outbound capacity must be non-zero");

        let (inbound_tx, inbound_rx) = bounded(inbound_capacity);
        let (outbound_tx, outbound_rx) = bounded(outbound_capacity);

        (
            Self {
                inbound: inbound_rx,
                outbound: outbound_tx,
                frames_sent: 0,
                frames_dropped: 0,
                span,
            },
            TransportEndpoint {
                inbound: inbound_tx,
                outbound: outbound_rx,
            },
        )
    }

    /// Frames successfully queued for the network side.
    #[inline]
    #[must_use]
    pub const fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Frames dropped because the outbound queue was full or closed.
    #[inline]
    #[must_use]
    pub const fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }
}

impl Transport for ChannelTransport {
    fn poll_inbound(&mut self) -> Option<Inbound> {
        match self.inbound.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    fn broadcast(&mut self, lane: Lane, frame: &[u8]) {
        let frame = OutboundFrame {
            lane,
            bytes: frame.to_vec(),
        };
        match self.outbound.try_send(frame) {
            Ok(()) => self.frames_sent += 1,
            Err(TrySendError::Full(frame)) => {
                self.frames_dropped += 1;
                warn!(
                    parent: &self.span,
                    lane = ?frame.lane,
                    len = frame.bytes.len(),
                    dropped = self.frames_dropped,
                    "outbound queue full, frame dropped"
                );
            }
            Err(TrySendError::Disconnected(_)) => {
                self.frames_dropped += 1;
                debug!(parent: &self.span, "outbound endpoint closed, frame dropped");
            }
        }
    }
}

impl TransportEndpoint {
    /// Queues a decoded message for the scheduler.
    ///
    /// # Errors
    ///
    /// [`TransportError::QueueFull`] when the inbound queue is at capacity,
    /// [`TransportError::Disconnected`] when the scheduler side is gone.
    pub fn deliver(&self, message: Inbound) -> TransportResult<()> {
        self.inbound.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::QueueFull,
            TrySendError::Disconnected(_) => TransportError::Disconnected,
        })
    }

    /// Decodes a raw packet from the client driving `entity` and queues it.
    ///
    /// Nothing is queued unless the whole packet decodes.
    ///
    /// # Errors
    ///
    /// [`TransportError::Decode`] for malformed bytes,
    /// [`TransportError::UnexpectedPayload`] for a snapshot sent inbound,
    /// otherwise as [`Self::deliver`].
    pub fn deliver_bytes(&self, entity: Handle, bytes: &[u8]) -> TransportResult<()> {
        let packet = decode(bytes)?;
        let message = match packet.payload {
            Payload::Input(input) => Inbound::Input { entity, input },
            Payload::Admin(admin) => Inbound::Admin(admin),
            Payload::StateSnapshot(_) => {
                return Err(TransportError::UnexpectedPayload(PayloadType::StateSnapshot))
            }
        };
        self.deliver(message)
    }

    /// Takes the next outbound frame, if any. Never blocks.
    #[must_use]
    pub fn try_recv_outbound(&self) -> Option<OutboundFrame> {
        self.outbound.try_recv().ok()
    }

    /// Takes every outbound frame queued right now.
    pub fn drain_outbound(&self) -> impl Iterator<Item = OutboundFrame> + '_ {
        self.outbound.try_iter()
    }
}
