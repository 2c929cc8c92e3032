use std::sync::Arc;

use rayon::prelude::*;

use super::System;
use crate::ecs::{Action, Actor, EntityHandle, Position};
use crate::error::{ScheduleError, ScheduleResult, WorldResult};
use crate::schedule::{Access, Resource, TickContext};
use crate::world::{EcsView, World};

/// Picks a target for every idle actor.
///
/// An actor not already moving targets the nearest plant in its chunk and
/// switches to `Move`. Harvesting is not implemented yet and leaves the
/// actor untouched.
///
/// The actor array is split across a dedicated rayon pool when one is
/// configured. Slots are disjoint, so no per-actor locking is needed.
#[derive(Clone, Default)]
pub struct ActorSystem {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl std::fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorSystem")
            .field("threads", &self.pool.as_ref().map(|p| p.current_num_threads()))
            .finish()
    }
}

impl ActorSystem {
    /// Runs every pass on the calling worker thread.
    #[must_use]
    pub fn sequential() -> Self {
        Self { pool: None }
    }

    /// Runs passes on a dedicated pool of `threads` threads.
    ///
    /// `0` lets rayon pick the thread count.
    ///
    /// # Errors
    ///
    /// `ThreadPool` if the pool cannot be built.
    pub fn with_threads(threads: usize) -> ScheduleResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("worldsim-actor-{i}"))
            .build()
            .map_err(|e| ScheduleError::ThreadPool(e.to_string()))?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    /// Threads in the inner pool, if any.
    #[must_use]
    pub fn threads(&self) -> Option<usize> {
        self.pool.as_ref().map(|p| p.current_num_threads())
    }
}

/// One actor's decision.
fn decide(
    world: &World,
    view: &EcsView<'_>,
    actor: &mut Actor,
    owner: EntityHandle,
) -> WorldResult<()> {
    if owner.is_null() || view.entities.get_valid(owner).is_none() {
        return Ok(());
    }
    match actor.action {
        Action::Harvest | Action::Move => Ok(()),
        Action::None | Action::Idle => {
            let Some(position) = view.position_of(owner) else {
                return Ok(());
            };
            actor.target = world.find_nearest_plant(position, view)?;
            actor.action = Action::Move;
            Ok(())
        }
    }
}

impl System for ActorSystem {
    fn name(&self) -> &'static str {
        "actor"
    }

    fn access(&self) -> Access {
        Access::new()
            .reads(Resource::World)
            .reads(Resource::Entities)
            .read::<Position>()
            .write::<Actor>()
    }

    fn process(&self, ctx: &TickContext<'_>) -> ScheduleResult<()> {
        let world = ctx.read_world()?;
        let entities = ctx.read_entities()?;
        let positions = ctx.read::<Position>()?;
        let mut actors = ctx.write::<Actor>()?;

        let world: &World = &world;
        let view = EcsView::new(&entities, &positions);
        let (slots, owners) = actors.split_mut();

        match &self.pool {
            Some(pool) => pool.install(|| {
                slots
                    .par_iter_mut()
                    .zip(owners.par_iter())
                    .try_for_each(|(actor, &owner)| decide(world, &view, actor, owner))
            })?,
            None => slots
                .iter_mut()
                .zip(owners.iter())
                .try_for_each(|(actor, &owner)| decide(world, &view, actor, owner))?,
        }

        tracing::trace!(tick = ctx.tick(), actors = slots.len(), "actor pass");
        Ok(())
    }
}
