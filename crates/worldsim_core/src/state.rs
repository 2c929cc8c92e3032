//! # Shared Simulation State
//!
//! Everything systems touch during a tick: the ECS context and the world.
//! Shared between the scheduler and its workers through an `Arc`.

use parking_lot::{Mutex, RwLock};

use crate::config::{PopulationConfig, WorldConfig};
use crate::ecs::{Ecs, EntityHandle, Position};
use crate::error::WorldResult;
use crate::world::{PopulationReport, World};

/// ECS context plus the world it lives in.
///
/// Lock order: world, then entities, then storages by `ComponentId`.
pub struct SimState {
    /// Entities and components.
    pub ecs: Ecs,
    /// The tiled world.
    pub world: RwLock<World>,
    /// Deaths requested during the running phase.
    pending_deaths: Mutex<Vec<EntityHandle>>,
}

impl SimState {
    /// Wraps an existing world with an empty ECS context.
    #[must_use]
    pub fn new(world: World) -> Self {
        Self {
            ecs: Ecs::new(),
            world: RwLock::new(world),
            pending_deaths: Mutex::new(Vec::new()),
        }
    }

    /// Builds an empty world from configuration.
    ///
    /// # Errors
    ///
    /// `InvalidDimensions` if the configured size is unusable.
    pub fn from_config(config: &WorldConfig) -> WorldResult<Self> {
        let world = World::with_chunk_size(config.width, config.height, config.chunk_size)?;
        Ok(Self::new(world))
    }

    /// Populates the world from configuration.
    ///
    /// # Errors
    ///
    /// As [`World::populate`].
    pub fn populate(&self, config: &PopulationConfig) -> WorldResult<PopulationReport> {
        self.world.write().populate(&self.ecs, config)
    }

    /// Queues `entity` to be marked dead at the next phase boundary.
    ///
    /// Systems running in the same phase keep seeing it as valid.
    pub fn defer_kill(&self, entity: EntityHandle) {
        self.pending_deaths.lock().push(entity);
    }

    /// Marks every queued entity dead.
    ///
    /// Returns how many were alive until now.
    pub fn apply_deaths(&self) -> usize {
        let pending = std::mem::take(&mut *self.pending_deaths.lock());
        pending
            .into_iter()
            .filter(|&entity| self.ecs.kill(entity))
            .count()
    }

    /// Takes every dead entity out of the world and releases its components.
    ///
    /// Returns the dead entities reaped.
    pub fn reap_dead(&self) -> Vec<EntityHandle> {
        let mut world = self.world.write();
        let dead = self.ecs.entities().read().dead_with_components();
        if dead.is_empty() {
            return dead;
        }

        {
            let entities = self.ecs.entities().read();
            let positions = self.ecs.storage::<Position>().read();
            for &entity in &dead {
                world.remove_entity(&entities, &positions, entity);
            }
        }
        drop(world);

        for &entity in &dead {
            self.ecs.despawn(entity);
        }
        tracing::debug!(count = dead.len(), "reaped dead entities");
        dead
    }
}
