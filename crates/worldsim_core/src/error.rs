//! # Simulation Error Types
//!
//! All errors that can occur in the simulation core.
//!
//! Querying a component an entity lacks is not an error: those lookups
//! return `Option`/`bool`.

use std::path::PathBuf;

use thiserror::Error;

use crate::ecs::{ComponentId, EntityHandle};
use crate::schedule::Resource;

/// Errors from the entity/component registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The handle does not name a live entity.
    #[error("stale or unknown {0}")]
    StaleEntity(EntityHandle),

    /// The entity already holds a component of this type.
    #[error("{entity} already has a {component} component")]
    DuplicateComponent {
        /// The entity.
        entity: EntityHandle,
        /// The component type.
        component: ComponentId,
    },

    /// No prefab with this name.
    #[error("unknown prefab: {0}")]
    UnknownPrefab(String),

    /// A prefab with this name already exists.
    #[error("prefab already exists: {0}")]
    DuplicatePrefab(String),

    /// Too many prefabs for the 16-bit prefab id space.
    #[error("prefab limit reached ({0})")]
    PrefabLimit(usize),

    /// The registry has used every entity index.
    #[error("entity limit reached ({0})")]
    EntityLimit(usize),

    /// A storage has used every slot index.
    #[error("{0} storage is full")]
    StorageFull(ComponentId),
}

/// Result type for registry operations.
pub type EcsResult<T> = Result<T, EcsError>;

/// Errors from the spatial world.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// World dimensions are not exact multiples of the chunk size.
    #[error("world {width}x{height} must be a non-zero multiple of chunk size {chunk_size}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Chunk size.
        chunk_size: u32,
    },

    /// Coordinate outside the world.
    #[error("coordinate ({x}, {y}) out of bounds for {width}x{height} world")]
    OutOfBounds {
        /// X coordinate.
        x: i32,
        /// Y coordinate.
        y: i32,
        /// World width.
        width: u32,
        /// World height.
        height: u32,
    },

    /// The entity has no Position component.
    #[error("{0} has no position")]
    MissingPosition(EntityHandle),

    /// Population gave up finding a free tile.
    #[error("no valid tile found for {kind} after {attempts} attempts")]
    PlacementExhausted {
        /// Prefab being placed.
        kind: &'static str,
        /// Attempts made.
        attempts: u32,
    },

    /// Registry failure during population.
    #[error(transparent)]
    Ecs(#[from] EcsError),
}

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;

/// Errors from system wiring and the tick scheduler.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Two systems in one phase conflict: one writes what the other touches.
    #[error("systems `{first}` and `{second}` conflict on {resource} in one phase")]
    AccessConflict {
        /// First system.
        first: &'static str,
        /// Second system.
        second: &'static str,
        /// Contested resource.
        resource: Resource,
    },

    /// A system touched a resource it did not declare.
    #[error("system `{system}` requested undeclared {mode} access to {resource}")]
    UndeclaredAccess {
        /// The system.
        system: &'static str,
        /// The resource.
        resource: Resource,
        /// "read" or "write".
        mode: &'static str,
    },

    /// Systems did not finish within the stall timeout.
    #[error("tick {tick} stalled waiting for {pending:?}")]
    Stalled {
        /// The tick that stalled.
        tick: u64,
        /// Systems that never reported.
        pending: Vec<&'static str>,
    },

    /// A previous stall left the scheduler unusable.
    #[error("scheduler faulted by an earlier stall")]
    Faulted,

    /// The scheduler has been shut down.
    #[error("scheduler terminated")]
    Terminated,

    /// Spawning a worker thread failed.
    #[error("failed to spawn worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// Building the inner data-parallel pool failed.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),

    /// A system pass failed.
    #[error("system `{system}` failed: {source}")]
    System {
        /// The system.
        system: &'static str,
        /// What went wrong.
        #[source]
        source: Box<ScheduleError>,
    },

    /// World failure inside a system pass.
    #[error(transparent)]
    World(#[from] WorldError),
}

/// Result type for scheduler operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Errors loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file.
        path: PathBuf,
        /// The cause.
        #[source]
        source: std::io::Error,
    },

    /// TOML was malformed.
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values were well-formed but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Umbrella error for callers driving the whole simulation.
#[derive(Error, Debug)]
pub enum SimError {
    /// Registry error.
    #[error(transparent)]
    Ecs(#[from] EcsError),
    /// World error.
    #[error(transparent)]
    World(#[from] WorldError),
    /// Scheduler error.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for end-to-end simulation operations.
pub type SimResult<T> = Result<T, SimError>;
