//! # Simulation Configuration
//!
//! Loaded once at startup and immutable afterwards.

use std::path::Path;
use std::time::Duration;

use lockstep_core::{EntityStore, SpatialIndex};
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Startup configuration for a simulation instance.
///
/// Every field has a default, so an empty TOML document is valid.
///
/// ```rust
/// use lockstep_networking::SimConfig;
///
/// let config = SimConfig::from_toml_str("tick_rate = 30\nsnapshot_interval = 2").unwrap();
/// assert_eq!(config.tick_rate, 30);
/// assert_eq!(config.max_entities, 1000);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Fixed steps per second.
    pub tick_rate: u32,
    /// Upper bound accepted by `SetTickRate`.
    pub max_tick_rate: u32,
    /// Entity store capacity.
    pub max_entities: usize,
    /// World extent along X.
    pub world_width: f32,
    /// World extent along Y.
    pub world_height: f32,
    /// Broadcast a snapshot every N ticks.
    pub snapshot_interval: u64,
    /// Largest frame delta fed to the accumulator.
    pub max_frame_delta_ms: u64,
    /// Sleep between outer-loop iterations.
    pub idle_sleep_ms: u64,
    /// Inbound hand-off queue bound.
    pub inbound_queue_capacity: usize,
    /// Outbound hand-off queue bound.
    pub outbound_queue_capacity: usize,
    /// Emit a status line every N ticks (0 disables).
    pub status_interval_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            max_tick_rate: 240,
            max_entities: 1000,
            world_width: 1000.0,
            world_height: 1000.0,
            snapshot_interval: 3,
            max_frame_delta_ms: 250,
            idle_sleep_ms: 1,
            inbound_queue_capacity: 4096,
            outbound_queue_capacity: 64,
            status_interval_ticks: 600,
        }
    }
}

impl SimConfig {
    /// Highest accepted `max_tick_rate`; a 1 µs step.
    pub const TICK_RATE_LIMIT: u32 = 1_000_000;

    /// Highest accepted broad-phase cell count for the world size.
    pub const MAX_GRID_CELLS: usize = 1 << 22;

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on bad syntax or unknown keys,
    /// [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks every value against its allowed range.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        fn invalid(message: String) -> ConfigResult<()> {
            Err(ConfigError::Invalid(message))
        }

        if self.max_tick_rate == 0 || self.max_tick_rate > Self::TICK_RATE_LIMIT {
            return invalid(format!(
                "max_tick_rate must be in 1..={}, got {}",
                Self::TICK_RATE_LIMIT,
                self.max_tick_rate
            ));
        }
        if self.tick_rate == 0 || self.tick_rate > self.max_tick_rate {
            return invalid(format!(
                "tick_rate must be in 1..={}, got {}",
                self.max_tick_rate, self.tick_rate
            ));
        }
        if self.max_entities == 0 || self.max_entities > EntityStore::MAX_CAPACITY {
            return invalid(format!(
                "max_entities must be in 1..={}, got {}",
                EntityStore::MAX_CAPACITY,
                self.max_entities
            ));
        }
        for (name, value) in [("world_width", self.world_width), ("world_height", self.world_height)] {
            if !(value.is_finite() && value > 0.0) {
                return invalid(format!("{name} must be positive and finite, got {value}"));
            }
        }
        match SpatialIndex::cell_count(self.world_width, self.world_height) {
            Some(cells) if cells <= Self::MAX_GRID_CELLS => {}
            _ => {
                return invalid(format!(
                    "world {} x {} needs more than {} grid cells",
                    self.world_width,
                    self.world_height,
                    Self::MAX_GRID_CELLS
                ));
            }
        }
        if self.snapshot_interval == 0 {
            return invalid("snapshot_interval must be at least 1".into());
        }
        if self.max_frame_delta_ms == 0 {
            return invalid("max_frame_delta_ms must be at least 1".into());
        }
        if self.inbound_queue_capacity == 0 || self.outbound_queue_capacity == 0 {
            return invalid("queue capacities must be at least 1".into());
        }
        Ok(())
    }

    /// Fixed step for `tick_rate`.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        step_for_rate(self.tick_rate)
    }

    /// Frame delta clamp.
    #[must_use]
    pub const fn max_frame_delta(&self) -> Duration {
        Duration::from_millis(self.max_frame_delta_ms)
    }

    /// Sleep between outer-loop iterations.
    #[must_use]
    pub const fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }
}

/// Fixed step for `rate` Hz, to the nanosecond. Never shorter than 1 ns.
///
/// # Panics
///
/// Panics if `rate` is zero.
#[must_use]
pub fn step_for_rate(rate: u32) -> Duration {
    assert!(rate > 0, "tick rate must be non-zero");
    Duration::from_nanos((1_000_000_000 / u64::from(rate)).max(1))
}
