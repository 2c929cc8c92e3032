//! # Simulation Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an
//! empty document is a valid configuration.
//!
//! ```toml
//! [world]
//! width = 1000
//! height = 1000
//! chunk_size = 250
//!
//! [population]
//! seed = 12345
//! actors = 500
//! plants = 5000
//!
//! [scheduler]
//! workers = 4
//! stall_timeout_ms = 5000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::world::CHUNK_SIZE;

/// World dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Chunk side length in tiles.
    pub chunk_size: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 10_000,
            height: 10_000,
            chunk_size: CHUNK_SIZE,
        }
    }
}

/// Initial population.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Placement RNG seed.
    pub seed: u64,
    /// Actors to place.
    pub actors: usize,
    /// Plants to place.
    pub plants: usize,
    /// Draws per entity before placement gives up.
    pub max_attempts: u32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            actors: 50_000,
            plants: 500_000,
            max_attempts: 10_000,
        }
    }
}

/// Tick scheduler tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Worker threads running systems.
    pub workers: usize,
    /// Threads in the data-parallel actor pool. 0 lets rayon decide.
    pub inner_workers: usize,
    /// How long a tick may wait for its systems.
    pub stall_timeout_ms: u64,
    /// Reclaim dead entities after each tick.
    pub reap_dead: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            inner_workers: 0,
            stall_timeout_ms: 5_000,
            reap_dead: true,
        }
    }
}

impl SchedulerConfig {
    /// The stall timeout as a `Duration`.
    #[inline]
    #[must_use]
    pub const fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }
}

/// Top-level configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// World dimensions.
    pub world: WorldConfig,
    /// Initial population.
    pub population: PopulationConfig,
    /// Scheduler tuning.
    pub scheduler: SchedulerConfig,
}

impl SimConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// `Parse` on malformed TOML, `Invalid` on out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// `Invalid` naming the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if world.chunk_size == 0 {
            return Err(ConfigError::Invalid("world.chunk_size must be non-zero".into()));
        }
        if world.width == 0
            || world.height == 0
            || world.width % world.chunk_size != 0
            || world.height % world.chunk_size != 0
        {
            return Err(ConfigError::Invalid(format!(
                "world {}x{} must be a non-zero multiple of chunk_size {}",
                world.width, world.height, world.chunk_size
            )));
        }
        if i32::try_from(world.width).is_err() || i32::try_from(world.height).is_err() {
            return Err(ConfigError::Invalid("world dimensions exceed i32::MAX".into()));
        }
        if self.population.max_attempts == 0 {
            return Err(ConfigError::Invalid("population.max_attempts must be non-zero".into()));
        }
        if self.scheduler.workers == 0 {
            return Err(ConfigError::Invalid("scheduler.workers must be non-zero".into()));
        }
        if self.scheduler.stall_timeout_ms == 0 {
            return Err(ConfigError::Invalid("scheduler.stall_timeout_ms must be non-zero".into()));
        }
        Ok(())
    }
}
