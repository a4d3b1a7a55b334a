//! # Lockstep Server
//!
//! Runs the tick scheduler against an in-process channel transport.
//!
//! ## Usage
//!
//! ```bash
//! lockstep_server --config lockstep.toml --duration 10
//! RUST_LOG=debug lockstep_server
//! ```
//!
//! Without `--duration` the server runs until `quit` is typed on stdin, or
//! until stdin is closed from a terminal (Ctrl-D). Either way the scheduler
//! stops at a tick boundary and the shutdown summary is logged.

use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use lockstep_core::EntityFlags;
use lockstep_networking::protocol::{decode, SequenceTracker};
use lockstep_networking::{
    ChannelTransport, NoopRules, SimConfig, SimContext, StopHandle, SystemClock, TickScheduler,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Entities spawned at startup.
const SEED_ENTITIES: u16 = 16;

struct Args {
    config: Option<PathBuf>,
    duration: Option<Duration>,
}

fn print_usage() {
    println!("Usage: lockstep_server [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>     TOML configuration file (default: built-in)");
    println!("  -d, --duration <SECS>   Run for N seconds then exit (default: until `quit`)");
    println!("  -h, --help              Show this help");
}

/// Returns `None` when the process should exit after printing usage.
fn parse_args() -> Result<Option<Args>, String> {
    let mut args = Args {
        config: None,
        duration: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--config" | "-c" => {
                let path = iter.next().ok_or("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--duration" | "-d" => {
                let secs = iter.next().ok_or("--duration needs a value")?;
                let secs: f64 = secs
                    .parse()
                    .map_err(|_| format!("invalid duration: {secs}"))?;
                let duration = Duration::try_from_secs_f64(secs)
                    .map_err(|_| format!("invalid duration: {secs}"))?;
                args.duration = Some(duration);
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(None);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    Ok(Some(args))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let config = match &args.config {
        Some(path) => match SimConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "failed to load configuration");
                return ExitCode::FAILURE;
            }
        },
        None => SimConfig::default(),
    };

    let context = SimContext::new(config, "main");
    let (transport, endpoint) = ChannelTransport::new(&context);
    let mut scheduler = TickScheduler::new(context, transport, NoopRules, SystemClock);

    seed_entities(&mut scheduler);

    watch_stdin(scheduler.stop_handle());

    let stop = scheduler.stop_handle();
    let duration = args.duration;
    let network = thread::spawn(move || {
        let started = Instant::now();
        let mut tracker = SequenceTracker::new();
        let mut frames = 0u64;
        let mut bytes = 0usize;

        while !stop.is_stopped() {
            if duration.is_some_and(|limit| started.elapsed() >= limit) {
                stop.stop();
            }
            for frame in endpoint.drain_outbound() {
                frames += 1;
                bytes += frame.bytes.len();
                match decode(&frame.bytes) {
                    Ok(packet) => {
                        tracker.observe(packet.lane, packet.sequence);
                    }
                    Err(e) => warn!(error = %e, "undecodable outbound frame"),
                }
            }
            thread::sleep(Duration::from_millis(5));
        }

        (frames, bytes, tracker)
    });

    if let Err(e) = scheduler.start() {
        error!(error = %e, "scheduler failed to start");
        return ExitCode::FAILURE;
    }

    let Ok((frames, bytes, tracker)) = network.join() else {
        error!("network thread panicked");
        return ExitCode::FAILURE;
    };

    let stats = scheduler.stats();
    info!(
        ticks = stats.ticks,
        snapshots = stats.snapshots_sent,
        clamped_frames = stats.clamped_frames,
        pairs = stats.pairs_reported,
        frames_received = frames,
        bytes_received = bytes,
        lost = tracker.lost(lockstep_networking::Lane::Unreliable),
        "server shutdown"
    );

    ExitCode::SUCCESS
}

/// Returns true for console lines that request a shutdown.
fn is_stop_command(line: &str) -> bool {
    matches!(line.trim(), "quit" | "exit" | "stop")
}

/// Stops the scheduler on a stop command, or on end of input from a terminal.
///
/// A redirected stdin (e.g. `/dev/null` under a supervisor) reaching EOF
/// leaves the server running.
fn watch_stdin(stop: StopHandle) {
    let interactive = std::io::stdin().is_terminal();
    let spawned = thread::Builder::new()
        .name("stdin-watch".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) if is_stop_command(&line) => {
                        info!("stop requested from console");
                        stop.stop();
                        return;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "stdin read failed");
                        return;
                    }
                }
            }
            if interactive {
                info!("stdin closed, stopping");
                stop.stop();
            }
        });

    if let Err(e) = spawned {
        warn!(error = %e, "console watcher unavailable");
    }
}

/// Spreads a ring of entities around the world center, moving outwards.
fn seed_entities<T, R, C>(scheduler: &mut TickScheduler<T, R, C>)
where
    T: lockstep_networking::Transport,
    R: lockstep_networking::GameplayRules,
    C: lockstep_networking::Clock,
{
    let (cx, cy) = {
        let config = scheduler.context().config();
        (config.world_width / 2.0, config.world_height / 2.0)
    };
    let store = scheduler.store_mut();

    for i in 0..SEED_ENTITIES {
        let angle = f32::from(i) / f32::from(SEED_ENTITIES) * std::f32::consts::TAU;
        let (sin, cos) = angle.sin_cos();
        let flags = if i % 4 == 0 { EntityFlags::PLAYER } else { EntityFlags::ENEMY };
        match store.spawn(cx + cos * 50.0, cy + sin * 50.0, cos * 20.0, sin * 20.0, flags) {
            Ok(handle) => {
                if let Some(slot) = store.resolve(handle) {
                    store.set_radius(slot, 8.0);
                }
            }
            Err(e) => {
                warn!(error = %e, "seeding stopped early");
                break;
            }
        }
    }

    info!(live = store.live_count(), "entities seeded");
}
