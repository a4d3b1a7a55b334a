//! # Simulation Server
//!
//! The authoritative tick loop and what it is constructed from.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     TICK SCHEDULER                       │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌─────────────────┐   ┌────────────┐   │
//! │  │ Inbound    │──▶│ Fixed-step tick │──▶│ Outbound   │   │
//! │  │ (bounded)  │   │ (single thread) │   │ (bounded)  │   │
//! │  └────────────┘   └────────┬────────┘   └────────────┘   │
//! │                            │                             │
//! │          ┌─────────────────▼─────────────────┐           │
//! │          │ EntityStore + SpatialIndex        │           │
//! │          └───────────────────────────────────┘           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is global: configuration and the logging span travel in a
//! [`SimContext`] built at startup.

mod clock;
mod config;
mod scheduler;

pub use clock::{Clock, ManualClock, SleepInterrupted, SystemClock};
pub use config::{step_for_rate, SimConfig};
pub use scheduler::{SchedulerState, SchedulerStats, TickScheduler};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::Span;

/// Startup context shared by the scheduler and its transport.
///
/// The configuration is immutable once wrapped.
#[derive(Clone, Debug)]
pub struct SimContext {
    config: Arc<SimConfig>,
    span: Span,
}

impl SimContext {
    /// Wraps `config` with a span named after `instance`.
    #[must_use]
    pub fn new(config: SimConfig, instance: &str) -> Self {
        let span = tracing::info_span!("sim", instance = %instance);
        Self::with_span(config, span)
    }

    /// Wraps `config` with a caller-provided span.
    #[must_use]
    pub fn with_span(config: SimConfig, span: Span) -> Self {
        Self {
            config: Arc::new(config),
            span,
        }
    }

    /// Startup configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Span every event of this instance is recorded under.
    #[inline]
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }
}

/// Requests a scheduler to stop. Cloneable and thread-safe.
///
/// The request is observed only between ticks; a tick in progress always
/// completes.
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    /// Creates a handle with no stop requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop.
    #[inline]
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Returns true once a stop was requested.
    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}
