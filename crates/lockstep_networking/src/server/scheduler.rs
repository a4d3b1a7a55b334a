//! # Tick Scheduler
//!
//! Fixed-timestep loop driving the simulation core.
//!
//! ## Tick Order
//!
//! 1. Drain inbound input/admin messages
//! 2. Integrate positions
//! 3. Rebuild the broad-phase index and report candidate pairs
//! 4. Broadcast a snapshot on cadence
//!
//! The four phases run strictly in order with no suspension points. After
//! the last phase, a requested resync is sent and a requested tick-rate
//! change takes effect.
//!
//! ## Allocation
//!
//! The snapshot record buffer and the encode buffer are sized at
//! construction and reused, so a tick never touches the heap (the
//! transport may copy frames it queues).

use std::time::Duration;

use lockstep_core::{EntityStore, SpatialIndex};
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::config::{step_for_rate, SimConfig};
use super::{SimContext, StopHandle};
use crate::error::{SchedulerError, SchedulerResult};
use crate::integration::GameplayRules;
use crate::protocol::{
    encode_into, AdminCommand, AdminMessage, Lane, LaneSequencer, Packet, Payload, StateSnapshot,
};
use crate::transport::{Inbound, Transport};

/// Scheduler lifecycle. `Stopped` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, not yet started.
    Idle,
    /// Inside [`TickScheduler::start`].
    Running,
    /// Finished; cannot be restarted.
    Stopped,
}

/// Counters since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Fixed ticks executed.
    pub ticks: u64,
    /// Snapshots handed to the transport (cadence and resync).
    pub snapshots_sent: u64,
    /// Resync snapshots among `snapshots_sent`.
    pub resyncs_sent: u64,
    /// Inputs applied to a live entity.
    pub inputs_applied: u64,
    /// Inputs whose handle no longer resolved.
    pub stale_inputs_dropped: u64,
    /// Admin commands rejected.
    pub admin_rejected: u64,
    /// Candidate pairs handed to the rules.
    pub pairs_reported: u64,
    /// Frames longer than the clamp.
    pub clamped_frames: u64,
}

/// Fixed-step accumulator loop over an [`EntityStore`] and [`SpatialIndex`].
///
/// The scheduler owns the simulation state. The transport, rules and clock
/// are collaborators supplied by the integrator.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use lockstep_core::EntityFlags;
/// use lockstep_networking::{
///     ChannelTransport, ManualClock, NoopRules, SimConfig, SimContext, TickScheduler,
/// };
///
/// let context = SimContext::new(SimConfig::default(), "doc");
/// let (transport, endpoint) = ChannelTransport::new(&context);
/// let mut scheduler = TickScheduler::new(context, transport, NoopRules, ManualClock::new());
/// scheduler.store_mut().spawn(10.0, 10.0, 60.0, 0.0, EntityFlags::PLAYER).unwrap();
///
/// assert_eq!(scheduler.advance(Duration::from_millis(50)), 3);
/// assert_eq!(scheduler.store().position(0), (13.0, 10.0));
/// assert!(endpoint.try_recv_outbound().is_some()); // tick 3 snapshot
/// ```
pub struct TickScheduler<T, R, C> {
    context: SimContext,
    store: EntityStore,
    index: SpatialIndex,
    transport: T,
    rules: R,
    clock: C,
    state: SchedulerState,
    stop: StopHandle,
    /// Last completed tick; ticks are numbered from 1.
    tick: u64,
    accumulator: Duration,
    tick_rate: u32,
    step: Duration,
    dt: f32,
    pending_tick_rate: Option<u32>,
    resync_requested: bool,
    sequencer: LaneSequencer,
    /// Reused snapshot payload.
    snapshot: StateSnapshot,
    /// Reused encode buffer.
    frame: Vec<u8>,
    stats: SchedulerStats,
}

impl<T, R, C> TickScheduler<T, R, C>
where
    T: Transport,
    R: GameplayRules,
    C: Clock,
{
    /// Creates an idle scheduler with an empty store and index sized from
    /// the context's configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configuration has not been validated and holds an
    /// invalid capacity, world size or tick rate.
    #[must_use]
    pub fn new(context: SimContext, transport: T, rules: R, clock: C) -> Self {
        let config = context.config();
        let max_entities = config.max_entities;
        let tick_rate = config.tick_rate;
        let store = EntityStore::new(max_entities);
        let index = SpatialIndex::new(config.world_width, config.world_height, max_entities);
        let frame_capacity = Packet::HEADER_SIZE
            + StateSnapshot::PREFIX_SIZE
            + max_entities * lockstep_core::SnapshotRecord::SIZE;

        info!(
            parent: context.span(),
            tick_rate,
            max_entities,
            snapshot_interval = config.snapshot_interval,
            "tick scheduler created"
        );

        Self {
            store,
            index,
            transport,
            rules,
            clock,
            state: SchedulerState::Idle,
            stop: StopHandle::new(),
            tick: 0,
            accumulator: Duration::ZERO,
            tick_rate,
            step: step_for_rate(tick_rate),
            dt: rate_to_dt(tick_rate),
            pending_tick_rate: None,
            resync_requested: false,
            sequencer: LaneSequencer::new(),
            snapshot: StateSnapshot::with_capacity(0, max_entities),
            frame: Vec::with_capacity(frame_capacity),
            stats: SchedulerStats::default(),
            context,
        }
    }

    /// Runs the outer loop until stopped.
    ///
    /// Each iteration measures the frame since the previous one, feeds it to
    /// [`Self::advance`], then sleeps for the configured idle time. Returns
    /// once a stop is requested or a sleep is interrupted; the scheduler is
    /// then `Stopped`.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::NotIdle`] if the scheduler already ran.
    pub fn start(&mut self) -> SchedulerResult<()> {
        if self.state != SchedulerState::Idle {
            return Err(SchedulerError::NotIdle(self.state));
        }
        self.state = SchedulerState::Running;

        let span = self.context.span().clone();
        let idle = self.context.config().idle_sleep();
        info!(parent: &span, tick_rate = self.tick_rate, "scheduler started");

        let mut last = self.clock.now();
        loop {
            let _entered = span.enter();
            if self.stop.is_stopped() {
                break;
            }

            let now = self.clock.now();
            self.advance(now.saturating_duration_since(last));
            last = now;

            if self.clock.sleep(idle).is_err() {
                warn!(tick = self.tick, "sleep interrupted, shutting down");
                break;
            }
        }

        self.state = SchedulerState::Stopped;
        info!(
            parent: &span,
            ticks = self.stats.ticks,
            snapshots = self.stats.snapshots_sent,
            "scheduler stopped"
        );
        Ok(())
    }

    /// Feeds one frame to the accumulator and runs every whole step it holds.
    ///
    /// The frame is clamped to the configured maximum first. A stop request
    /// is checked before each step. Returns the number of ticks executed.
    pub fn advance(&mut self, frame: Duration) -> u64 {
        let max_frame = self.context.config().max_frame_delta();
        let frame = if frame > max_frame {
            self.stats.clamped_frames += 1;
            debug!(?frame, ?max_frame, "frame delta clamped");
            max_frame
        } else {
            frame
        };
        self.accumulator += frame;

        let mut executed = 0;
        while self.accumulator >= self.step {
            if self.stop.is_stopped() {
                break;
            }
            self.accumulator -= self.step;
            self.run_tick();
            executed += 1;
        }
        executed
    }

    /// Executes exactly one tick.
    fn run_tick(&mut self) {
        let current = self.tick + 1;

        self.drain_inbound();
        self.store.integrate(self.dt);
        self.broad_phase();

        if current % self.context.config().snapshot_interval == 0 {
            self.broadcast_snapshot(current, Lane::Unreliable);
        }
        if self.resync_requested {
            self.resync_requested = false;
            self.broadcast_snapshot(current, Lane::Reliable);
            self.stats.resyncs_sent += 1;
        }
        if let Some(rate) = self.pending_tick_rate.take() {
            self.set_tick_rate(rate);
        }

        self.tick = current;
        self.stats.ticks += 1;

        let status_interval = self.context.config().status_interval_ticks;
        if status_interval != 0 && current % status_interval == 0 {
            debug!(
                tick = current,
                live = self.store.live_count(),
                pairs = self.stats.pairs_reported,
                snapshots = self.stats.snapshots_sent,
                "tick status"
            );
        }
    }

    /// Applies at most one queue's worth of inbound messages.
    fn drain_inbound(&mut self) {
        let limit = self.context.config().inbound_queue_capacity;
        for _ in 0..limit {
            let Some(message) = self.transport.poll_inbound() else {
                break;
            };
            match message {
                Inbound::Input { entity, input } => match self.store.resolve(entity) {
                    Some(slot) => {
                        self.rules.apply_input(&mut self.store, slot, &input);
                        self.stats.inputs_applied += 1;
                    }
                    None => {
                        self.stats.stale_inputs_dropped += 1;
                        debug!(%entity, "input for stale handle dropped");
                    }
                },
                Inbound::Admin(admin) => self.handle_admin(admin),
            }
        }
    }

    fn handle_admin(&mut self, admin: AdminMessage) {
        match admin.command {
            AdminCommand::SetTickRate => {
                let max = self.context.config().max_tick_rate;
                match validate_tick_rate(admin.value, max) {
                    Some(rate) => {
                        info!(from = self.tick_rate, to = rate, "tick rate change scheduled");
                        self.pending_tick_rate = Some(rate);
                    }
                    None => {
                        self.stats.admin_rejected += 1;
                        warn!(value = admin.value, max, "SetTickRate rejected");
                    }
                }
            }
            AdminCommand::ForceResync => {
                self.resync_requested = true;
            }
        }
    }

    fn set_tick_rate(&mut self, rate: u32) {
        self.tick_rate = rate;
        self.step = step_for_rate(rate);
        self.dt = rate_to_dt(rate);
    }

    /// Rebuilds the index and reports each adjacent live pair once.
    fn broad_phase(&mut self) {
        let Self {
            store,
            index,
            rules,
            stats,
            ..
        } = self;

        index.rebuild(store);

        for slot in 0..store.high_water() {
            if !store.is_slot_active(slot) {
                continue;
            }
            let (x, y) = store.position(slot);
            index.query_neighborhood(x, y, |other| {
                if other > slot && store.is_slot_active(slot) && store.is_slot_active(other) {
                    rules.resolve_pair(store, slot, other);
                    stats.pairs_reported += 1;
                }
            });
        }
    }

    fn broadcast_snapshot(&mut self, server_tick: u64, lane: Lane) {
        let mut snapshot = std::mem::take(&mut self.snapshot);
        snapshot.server_tick = server_tick;
        self.store.fill_snapshot(&mut snapshot.records);

        let packet = Packet::new(lane, self.sequencer.next(lane), Payload::StateSnapshot(snapshot));
        match encode_into(&packet, &mut self.frame) {
            Ok(()) => {
                self.transport.broadcast(lane, &self.frame);
                self.stats.snapshots_sent += 1;
            }
            Err(e) => warn!(error = %e, "snapshot encode failed"),
        }

        if let Payload::StateSnapshot(snapshot) = packet.payload {
            self.snapshot = snapshot;
        }
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// Last completed tick (0 before the first).
    #[inline]
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Current tick rate in Hz.
    #[inline]
    #[must_use]
    pub const fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Current fixed step.
    #[inline]
    #[must_use]
    pub const fn step(&self) -> Duration {
        self.step
    }

    /// Time carried over to the next frame.
    #[inline]
    #[must_use]
    pub const fn accumulator(&self) -> Duration {
        self.accumulator
    }

    /// Counters since construction.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Handle for requesting a stop from any thread.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Requests a stop; see [`StopHandle::stop`].
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Startup context.
    #[inline]
    #[must_use]
    pub const fn context(&self) -> &SimContext {
        &self.context
    }

    /// Entity state.
    #[inline]
    #[must_use]
    pub const fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Entity state, for seeding between ticks.
    #[inline]
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    /// Broad-phase index as of the last tick.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Transport collaborator.
    #[inline]
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Gameplay rules collaborator.
    #[inline]
    #[must_use]
    pub const fn rules(&self) -> &R {
        &self.rules
    }

    /// Gameplay rules collaborator, mutably.
    #[inline]
    pub fn rules_mut(&mut self) -> &mut R {
        &mut self.rules
    }
}

/// Accepts whole rates in `1..=max`, never above [`SimConfig::TICK_RATE_LIMIT`].
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn validate_tick_rate(value: f32, max: u32) -> Option<u32> {
    let max = max.min(SimConfig::TICK_RATE_LIMIT);
    if !value.is_finite() || value.fract() != 0.0 || value < 1.0 || value > max as f32 {
        return None;
    }
    Some(value as u32)
}

#[allow(clippy::cast_precision_loss)]
fn rate_to_dt(rate: u32) -> f32 {
    1.0 / rate as f32
}
