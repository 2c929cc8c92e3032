//! # Worldsim Core
//!
//! Tick-based ecosystem simulation on a chunked 2-D world:
//! - Handle-based ECS with dense per-type component storage
//! - Chunked terrain with per-tile occupancy
//! - Systems run concurrently on a fixed worker pool, one barrier per tick
//!
//! ## Architecture Rules
//!
//! 1. **No pointers across ticks** - Entities and components are referenced
//!    by generation-checked handles
//! 2. **No global state** - The ECS and the world hang off an explicit
//!    [`SimState`]
//! 3. **Declared access** - Systems lock only what they declare, in
//!    world → entities → storage order
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use worldsim_core::{Game, SimConfig, SimState};
//!
//! let config = SimConfig::from_toml_str("[population]\nactors = 100\nplants = 1000\n")?;
//! let state = Arc::new(SimState::from_config(&config.world)?);
//! state.populate(&config.population)?;
//!
//! let mut game = Game::with_default_systems(state, config.scheduler)?;
//! for _ in 0..10 {
//!     game.tick()?;
//! }
//! # Ok::<(), worldsim_core::SimError>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod schedule;
pub mod state;
pub mod systems;
pub mod world;

pub use config::{PopulationConfig, SchedulerConfig, SimConfig, WorldConfig};
pub use ecs::{
    Action, Actor, CompactMap, Component, ComponentHandle, ComponentId, ComponentStorage, Creature,
    Ecs, Entity, EntityHandle, EntityRegistry, Inventory, Movable, Name, Pathfinding, Plant,
    Position, PrefabId, Waypoint,
};
pub use error::{
    ConfigError, EcsError, EcsResult, ScheduleError, ScheduleResult, SimError, SimResult,
    WorldError, WorldResult,
};
pub use schedule::{Access, Game, GameBuilder, Resource, SystemState, TickContext, TickStats};
pub use state::SimState;
pub use systems::{ActorSystem, CreatureSystem, MovableSystem, PlantSystem, System};
pub use world::{
    ChunkCoord, EcsView, PopulationReport, Terrain, TerrainKind, World, WorldChunk, CHUNK_SIZE,
};
