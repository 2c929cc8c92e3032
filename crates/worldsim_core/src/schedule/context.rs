//! # Tick Context
//!
//! The only way a system reaches shared state during a tick. Every guard
//! request is checked against the system's declared [`Access`].
//!
//! Systems must take guards in lock order: world, then entities, then
//! component storages by `ComponentId`.

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use super::access::{Access, Resource};
use crate::ecs::{Component, ComponentStorage, EntityHandle, EntityRegistry};
use crate::error::{ScheduleError, ScheduleResult};
use crate::state::SimState;
use crate::world::World;

/// Per-system, per-tick view of the shared state.
pub struct TickContext<'a> {
    shared: &'a SimState,
    access: &'a Access,
    system: &'static str,
    tick: u64,
}

impl<'a> TickContext<'a> {
    /// Creates a context for one system pass.
    #[must_use]
    pub const fn new(
        shared: &'a SimState,
        access: &'a Access,
        system: &'static str,
        tick: u64,
    ) -> Self {
        Self {
            shared,
            access,
            system,
            tick,
        }
    }

    /// The tick being processed.
    #[inline]
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Name of the system this context belongs to.
    #[inline]
    #[must_use]
    pub const fn system(&self) -> &'static str {
        self.system
    }

    fn check_read(&self, resource: Resource) -> ScheduleResult<()> {
        if self.access.can_read(resource) {
            Ok(())
        } else {
            Err(self.undeclared(resource, "read"))
        }
    }

    fn check_write(&self, resource: Resource) -> ScheduleResult<()> {
        if self.access.can_write(resource) {
            Ok(())
        } else {
            Err(self.undeclared(resource, "write"))
        }
    }

    fn undeclared(&self, resource: Resource, mode: &'static str) -> ScheduleError {
        ScheduleError::UndeclaredAccess {
            system: self.system,
            resource,
            mode,
        }
    }

    /// Shared guard on the world.
    ///
    /// # Errors
    ///
    /// `UndeclaredAccess` unless the system declared the world.
    pub fn read_world(&self) -> ScheduleResult<RwLockReadGuard<'a, World>> {
        self.check_read(Resource::World)?;
        Ok(self.shared.world.read())
    }

    /// Exclusive guard on the world.
    ///
    /// # Errors
    ///
    /// `UndeclaredAccess` unless the system declared a world write.
    pub fn write_world(&self) -> ScheduleResult<RwLockWriteGuard<'a, World>> {
        self.check_write(Resource::World)?;
        Ok(self.shared.world.write())
    }

    /// Shared guard on the entity registry.
    ///
    /// # Errors
    ///
    /// `UndeclaredAccess` unless the system declared the registry.
    pub fn read_entities(&self) -> ScheduleResult<RwLockReadGuard<'a, EntityRegistry>> {
        self.check_read(Resource::Entities)?;
        Ok(self.shared.ecs.entities().read())
    }

    /// Exclusive guard on the entity registry.
    ///
    /// # Errors
    ///
    /// `UndeclaredAccess` unless the system declared a registry write.
    pub fn write_entities(&self) -> ScheduleResult<RwLockWriteGuard<'a, EntityRegistry>> {
        self.check_write(Resource::Entities)?;
        Ok(self.shared.ecs.entities().write())
    }

    /// Shared guard on `C`'s storage.
    ///
    /// # Errors
    ///
    /// `UndeclaredAccess` unless the system declared `C`.
    pub fn read<C: Component>(&self) -> ScheduleResult<RwLockReadGuard<'a, ComponentStorage<C>>> {
        self.check_read(Resource::of::<C>())?;
        Ok(self.shared.ecs.storage::<C>().read())
    }

    /// Exclusive guard on `C`'s storage.
    ///
    /// # Errors
    ///
    /// `UndeclaredAccess` unless the system declared a write of `C`.
    pub fn write<C: Component>(&self) -> ScheduleResult<RwLockWriteGuard<'a, ComponentStorage<C>>> {
        self.check_write(Resource::of::<C>())?;
        Ok(self.shared.ecs.storage::<C>().write())
    }

    /// Marks `entity` dead once the current phase completes.
    ///
    /// Needs no declared access: every system in the phase still sees the
    /// entity as valid, whatever order they run in.
    pub fn kill(&self, entity: EntityHandle) {
        self.shared.defer_kill(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Actor, Plant};

    #[test]
    fn test_undeclared_access_refused() {
        let state = SimState::new(World::with_chunk_size(10, 10, 10).unwrap());
        let access = Access::new().write::<Plant>().reads(Resource::World);
        let ctx = TickContext::new(&state, &access, "gardener", 3);

        assert!(ctx.write::<Plant>().is_ok());
        assert!(ctx.read_world().is_ok());
        assert!(matches!(
            ctx.write_world(),
            Err(ScheduleError::UndeclaredAccess {
                system: "gardener",
                resource: Resource::World,
                mode: "write"
            })
        ));
        assert!(matches!(
            ctx.read::<Actor>(),
            Err(ScheduleError::UndeclaredAccess { mode: "read", .. })
        ));
        assert!(ctx.read_entities().is_err());
        assert_eq!(ctx.tick(), 3);
    }

    #[test]
    fn test_kill_is_deferred() {
        let state = SimState::new(World::with_chunk_size(10, 10, 10).unwrap());
        let e = state.ecs.spawn().unwrap();
        let access = Access::new();
        let ctx = TickContext::new(&state, &access, "reaper", 0);

        ctx.kill(e);
        assert!(state.ecs.is_valid(e));
        assert_eq!(state.apply_deaths(), 1);
        assert!(!state.ecs.is_valid(e));
    }
}
