//! End-to-end tests driving the scheduler through its collaborators.

use std::thread;
use std::time::Duration;

use lockstep_core::{EntityFlags, EntityStore};
use lockstep_networking::protocol::{SequenceStatus, SequenceTracker};
use lockstep_networking::{
    decode, encode, ChannelTransport, GameplayRules, InputMask, InputMessage, Lane, ManualClock,
    NoopRules, Packet, Payload, SchedulerState, SimConfig, SimContext, StopHandle, SystemClock,
    TickScheduler, TransportEndpoint,
};

/// Records every pair; optionally despawns the second entity of each pair
/// or requests a stop on the first pair.
#[derive(Default)]
struct RecordingRules {
    pairs: Vec<(usize, usize)>,
    despawn_second: bool,
    stop_on_pair: Option<StopHandle>,
}

impl GameplayRules for RecordingRules {
    fn resolve_pair(&mut self, store: &mut EntityStore, a: usize, b: usize) {
        assert!(a < b, "pair must be ordered: ({a}, {b})");
        assert!(store.is_slot_active(a) && store.is_slot_active(b));
        self.pairs.push((a, b));

        if self.despawn_second {
            store.despawn(store.handle_at(b)).unwrap();
        }
        if let Some(stop) = &self.stop_on_pair {
            stop.stop();
        }
    }
}

fn build<R: GameplayRules>(
    config: SimConfig,
    rules: R,
    clock: ManualClock,
) -> (TickScheduler<ChannelTransport, R, ManualClock>, TransportEndpoint) {
    let context = SimContext::new(config, "scheduler_test");
    let (transport, endpoint) = ChannelTransport::new(&context);
    (TickScheduler::new(context, transport, rules, clock), endpoint)
}

fn unclamped() -> SimConfig {
    SimConfig {
        max_frame_delta_ms: 1000,
        ..SimConfig::default()
    }
}

#[test]
fn one_second_frame_at_60hz_runs_exactly_60_ticks() {
    let clock = ManualClock::with_frames([Duration::from_secs(1)]);
    let (mut scheduler, _endpoint) = build(unclamped(), NoopRules, clock);

    scheduler.start().unwrap();

    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(scheduler.tick(), 60);
    assert_eq!(scheduler.stats().ticks, 60);
    assert!(scheduler.accumulator() < scheduler.step());
}

#[test]
fn stall_is_clamped_to_quarter_second() {
    let clock = ManualClock::with_frames([Duration::from_secs(5)]);
    let (mut scheduler, _endpoint) = build(SimConfig::default(), NoopRules, clock);

    scheduler.start().unwrap();

    assert_eq!(scheduler.tick(), 15);
    assert_eq!(scheduler.stats().clamped_frames, 1);
}

#[test]
fn tick_counter_is_monotonic_across_frames() {
    let frames = [3u64, 17, 40, 1, 250].map(Duration::from_millis);
    let clock = ManualClock::with_frames(frames);
    let (mut scheduler, _endpoint) = build(SimConfig::default(), NoopRules, clock);

    scheduler.start().unwrap();

    // 311 ms at 60 Hz.
    assert_eq!(scheduler.tick(), 18);
}

#[test]
fn pairs_reported_once_for_adjacent_cells_only() {
    let (mut scheduler, _endpoint) = build(SimConfig::default(), RecordingRules::default(), ManualClock::new());
    let store = scheduler.store_mut();
    store.spawn(10.0, 10.0, 0.0, 0.0, EntityFlags::PLAYER).unwrap();
    store.spawn(20.0, 20.0, 0.0, 0.0, EntityFlags::ENEMY).unwrap();
    store.spawn(100.0, 10.0, 0.0, 0.0, EntityFlags::ENEMY).unwrap();
    store.spawn(500.0, 500.0, 0.0, 0.0, EntityFlags::ENEMY).unwrap();

    scheduler.advance(scheduler.step());

    let mut pairs = scheduler.rules().pairs.clone();
    pairs.sort_unstable();
    assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    assert_eq!(scheduler.stats().pairs_reported, 3);
}

#[test]
fn pairs_skip_entities_despawned_earlier_in_the_tick() {
    let rules = RecordingRules {
        despawn_second: true,
        ..RecordingRules::default()
    };
    let (mut scheduler, _endpoint) = build(SimConfig::default(), rules, ManualClock::new());
    for _ in 0..3 {
        scheduler.store_mut().spawn(5.0, 5.0, 0.0, 0.0, EntityFlags::ENEMY).unwrap();
    }

    scheduler.advance(scheduler.step());

    // Slot 0 consumes both neighbours; nothing is left to pair with slot 1.
    let mut pairs = scheduler.rules().pairs.clone();
    pairs.sort_unstable();
    assert_eq!(pairs, vec![(0, 1), (0, 2)]);
    assert_eq!(scheduler.store().live_count(), 1);
}

#[test]
fn stop_inside_a_tick_lets_it_complete() {
    let (mut scheduler, endpoint) = build(SimConfig::default(), RecordingRules::default(), ManualClock::new());
    let stop = scheduler.stop_handle();
    scheduler.rules_mut().stop_on_pair = Some(stop);
    scheduler.store_mut().spawn(5.0, 5.0, 0.0, 0.0, EntityFlags::ENEMY).unwrap();
    scheduler.store_mut().spawn(6.0, 6.0, 0.0, 0.0, EntityFlags::ENEMY).unwrap();

    // Ticks 1..=3 are due; the stop lands during tick 1.
    endpoint
        .deliver(lockstep_networking::Inbound::Admin(
            lockstep_networking::AdminMessage::force_resync(),
        ))
        .unwrap();
    assert_eq!(scheduler.advance(scheduler.step() * 3), 1);
    assert_eq!(scheduler.tick(), 1);

    // The resync at the end of tick 1 still went out.
    let frame = endpoint.try_recv_outbound().unwrap();
    assert_eq!(frame.lane, Lane::Reliable);
}

#[test]
fn stop_from_another_thread_ends_the_loop() {
    let context = SimContext::new(SimConfig::default(), "threaded");
    let (transport, _endpoint) = ChannelTransport::new(&context);
    let mut scheduler = TickScheduler::new(context, transport, NoopRules, SystemClock);

    let stop = scheduler.stop_handle();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        stop.stop();
    });

    scheduler.start().unwrap();
    stopper.join().unwrap();

    assert_eq!(scheduler.state(), SchedulerState::Stopped);
}

#[test]
fn bytes_in_snapshots_out() {
    let (mut scheduler, endpoint) = build(SimConfig::default(), NoopRules, ManualClock::new());
    let player = scheduler
        .store_mut()
        .spawn(100.0, 200.0, 0.0, 0.0, EntityFlags::PLAYER)
        .unwrap();
    let enemy = scheduler
        .store_mut()
        .spawn(300.0, 400.0, 0.0, 0.0, EntityFlags::ENEMY)
        .unwrap();

    let input = InputMessage::new(1, InputMask::LEFT | InputMask::SHOOT, 1.0);
    let bytes = encode(&Packet::new(Lane::Unreliable, 0, Payload::Input(input))).unwrap();
    endpoint.deliver_bytes(player, &bytes).unwrap();

    scheduler.advance(scheduler.step() * 9);

    let slot = scheduler.store().resolve(player).unwrap();
    assert_eq!(scheduler.store().input_mask(slot), (InputMask::LEFT | InputMask::SHOOT).bits());

    let mut tracker = SequenceTracker::new();
    let mut ticks = Vec::new();
    for frame in endpoint.drain_outbound() {
        let packet = decode(&frame.bytes).unwrap();
        assert_eq!(tracker.observe(packet.lane, packet.sequence), SequenceStatus::InOrder);

        let Payload::StateSnapshot(snapshot) = packet.payload else {
            panic!("expected a snapshot");
        };
        ticks.push(snapshot.server_tick);

        let handles: Vec<_> = snapshot.records.iter().map(|r| r.handle()).collect();
        assert_eq!(handles, vec![player, enemy]);
        assert_eq!((snapshot.records[1].x, snapshot.records[1].y), (300.0, 400.0));
        assert_eq!(snapshot.records[1].kind, f32::from(EntityFlags::ENEMY.bits()));
    }

    assert_eq!(ticks, vec![3, 6, 9]);
    assert_eq!(tracker.highest(Lane::Unreliable), Some(2));
}

#[test]
fn start_twice_is_rejected() {
    let (mut scheduler, _endpoint) = build(SimConfig::default(), NoopRules, ManualClock::new());
    scheduler.start().unwrap();
    assert!(scheduler.start().is_err());
}
