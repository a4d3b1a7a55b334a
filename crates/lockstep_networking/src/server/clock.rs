//! # Clocks
//!
//! Time source for the outer loop. The scheduler only ever asks for the
//! current instant and for a short sleep between iterations.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;

/// A sleep ended early and the loop should shut down.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("sleep interrupted")]
pub struct SleepInterrupted;

/// Monotonic time source.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Waits roughly `duration`.
    ///
    /// # Errors
    ///
    /// [`SleepInterrupted`] when the wait cannot continue; the scheduler
    /// treats this as an orderly shutdown.
    fn sleep(&self, duration: Duration) -> Result<(), SleepInterrupted>;
}

/// Wall clock backed by [`Instant`] and [`std::thread::sleep`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> Result<(), SleepInterrupted> {
        std::thread::sleep(duration);
        Ok(())
    }
}

#[derive(Debug)]
struct ManualState {
    now: Instant,
    frames: VecDeque<Duration>,
}

/// Scripted clock for deterministic runs.
///
/// Time only moves when told to. Each `sleep` consumes the next scripted
/// frame and advances time by it; once the script is exhausted `sleep`
/// reports [`SleepInterrupted`]. Clones share the same timeline.
#[derive(Clone, Debug)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    /// Creates a clock with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::with_frames(std::iter::empty())
    }

    /// Creates a clock whose sleeps yield `frames` in order.
    #[must_use]
    pub fn with_frames(frames: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                now: Instant::now(),
                frames: frames.into_iter().collect(),
            })),
        }
    }

    /// Appends a frame to the script.
    pub fn push_frame(&self, frame: Duration) {
        self.state.lock().frames.push_back(frame);
    }

    /// Moves time forward without consuming the script.
    pub fn advance(&self, by: Duration) {
        self.state.lock().now += by;
    }

    /// Frames not yet consumed.
    #[must_use]
    pub fn remaining_frames(&self) -> usize {
        self.state.lock().frames.len()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.state.lock().now
    }

    fn sleep(&self, _duration: Duration) -> Result<(), SleepInterrupted> {
        let mut state = self.state.lock();
        let frame = state.frames.pop_front().ok_or(SleepInterrupted)?;
        state.now += frame;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_script() {
        let clock = ManualClock::with_frames([Duration::from_millis(10), Duration::from_millis(5)]);
        let start = clock.now();

        clock.sleep(Duration::from_millis(1)).unwrap();
        assert_eq!(clock.now() - start, Duration::from_millis(10));

        clock.advance(Duration::from_millis(1));
        clock.sleep(Duration::ZERO).unwrap();
        assert_eq!(clock.now() - start, Duration::from_millis(16));

        assert_eq!(clock.sleep(Duration::ZERO), Err(SleepInterrupted));
        assert_eq!(clock.remaining_frames(), 0);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        other.push_frame(Duration::from_secs(1));
        let start = clock.now();
        clock.sleep(Duration::ZERO).unwrap();
        assert_eq!(other.now() - start, Duration::from_secs(1));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let a = clock.now();
        clock.sleep(Duration::from_millis(1)).unwrap();
        assert!(clock.now() >= a);
    }
}
