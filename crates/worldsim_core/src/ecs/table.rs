//! # Component Table
//!
//! One lock-guarded storage per component type. Typed access goes through
//! [`Component::storage`]; operations that only know a [`ComponentId`]
//! (despawn, prefab instancing) dispatch on the handle's tag here, so a
//! handle can never be read as the wrong type.
//!
//! Storages are locked in `ComponentId` order.

use parking_lot::RwLock;

use super::component::{
    Actor, Component, Creature, Inventory, Movable, Name, Pathfinding, Plant, Position,
};
use super::handle::{ComponentHandle, ComponentId, EntityHandle};
use super::storage::ComponentStorage;
use crate::error::EcsResult;

/// Every component storage.
#[derive(Default)]
pub struct ComponentTable {
    pub(crate) names: RwLock<ComponentStorage<Name>>,
    pub(crate) positions: RwLock<ComponentStorage<Position>>,
    pub(crate) movables: RwLock<ComponentStorage<Movable>>,
    pub(crate) plants: RwLock<ComponentStorage<Plant>>,
    pub(crate) inventories: RwLock<ComponentStorage<Inventory>>,
    pub(crate) creatures: RwLock<ComponentStorage<Creature>>,
    pub(crate) actors: RwLock<ComponentStorage<Actor>>,
    pub(crate) pathfinding: RwLock<ComponentStorage<Pathfinding>>,
}

impl ComponentTable {
    /// Creates empty storages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The storage for `C`.
    #[inline]
    #[must_use]
    pub fn storage<C: Component>(&self) -> &RwLock<ComponentStorage<C>> {
        C::storage(self)
    }

    /// Releases the live component behind `handle`, whatever its type.
    ///
    /// Returns true if a live component was released.
    pub fn release(&self, handle: ComponentHandle) -> bool {
        match handle.kind() {
            ComponentId::None => false,
            ComponentId::Name => self.names.write().release(handle).is_some(),
            ComponentId::Position => self.positions.write().release(handle).is_some(),
            ComponentId::Movable => self.movables.write().release(handle).is_some(),
            ComponentId::Plant => self.plants.write().release(handle).is_some(),
            ComponentId::Inventory => self.inventories.write().release(handle).is_some(),
            ComponentId::Creature => self.creatures.write().release(handle).is_some(),
            ComponentId::Actor => self.actors.write().release(handle).is_some(),
            ComponentId::Pathfinding => self.pathfinding.write().release(handle).is_some(),
        }
    }

    /// Copies the prefab template behind `prefab` into the live partition.
    pub fn instantiate(
        &self,
        prefab: ComponentHandle,
        owner: EntityHandle,
    ) -> EcsResult<Option<ComponentHandle>> {
        match prefab.kind() {
            ComponentId::None => Ok(None),
            ComponentId::Name => self.names.write().instantiate(prefab, owner),
            ComponentId::Position => self.positions.write().instantiate(prefab, owner),
            ComponentId::Movable => self.movables.write().instantiate(prefab, owner),
            ComponentId::Plant => self.plants.write().instantiate(prefab, owner),
            ComponentId::Inventory => self.inventories.write().instantiate(prefab, owner),
            ComponentId::Creature => self.creatures.write().instantiate(prefab, owner),
            ComponentId::Actor => self.actors.write().instantiate(prefab, owner),
            ComponentId::Pathfinding => self.pathfinding.write().instantiate(prefab, owner),
        }
    }

    /// Pre-sizes the storage of one component type.
    pub fn reserve(&self, id: ComponentId, additional: usize) {
        match id {
            ComponentId::None => {}
            ComponentId::Name => self.names.write().reserve(additional),
            ComponentId::Position => self.positions.write().reserve(additional),
            ComponentId::Movable => self.movables.write().reserve(additional),
            ComponentId::Plant => self.plants.write().reserve(additional),
            ComponentId::Inventory => self.inventories.write().reserve(additional),
            ComponentId::Creature => self.creatures.write().reserve(additional),
            ComponentId::Actor => self.actors.write().reserve(additional),
            ComponentId::Pathfinding => self.pathfinding.write().reserve(additional),
        }
    }

    /// Live component count of one type.
    #[must_use]
    pub fn live_count(&self, id: ComponentId) -> usize {
        match id {
            ComponentId::None => 0,
            ComponentId::Name => self.names.read().live_count(),
            ComponentId::Position => self.positions.read().live_count(),
            ComponentId::Movable => self.movables.read().live_count(),
            ComponentId::Plant => self.plants.read().live_count(),
            ComponentId::Inventory => self.inventories.read().live_count(),
            ComponentId::Creature => self.creatures.read().live_count(),
            ComponentId::Actor => self.actors.read().live_count(),
            ComponentId::Pathfinding => self.pathfinding.read().live_count(),
        }
    }

    /// Drops every live component in every storage.
    pub fn clear(&self) {
        self.names.write().clear();
        self.positions.write().clear();
        self.movables.write().clear();
        self.plants.write().clear();
        self.inventories.write().clear();
        self.creatures.write().clear();
        self.actors.write().clear();
        self.pathfinding.write().clear();
    }
}
