//! # ECS Context
//!
//! The entity registry and every component storage, bundled into one
//! explicit object that is handed to the world and the systems. Independent
//! contexts never share state, so tests can run many in parallel.
//!
//! Lock order: entity registry first, then storages by `ComponentId`.

use parking_lot::RwLock;

use super::component::Component;
use super::entity::{EntityRegistry, PrefabId};
use super::handle::{ComponentHandle, ComponentId, EntityHandle};
use super::storage::ComponentStorage;
use super::table::ComponentTable;
use crate::error::{EcsError, EcsResult};

/// Entity registry plus component table.
#[derive(Default)]
pub struct Ecs {
    entities: RwLock<EntityRegistry>,
    components: ComponentTable,
}

impl Ecs {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The entity registry lock.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &RwLock<EntityRegistry> {
        &self.entities
    }

    /// The component table.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &ComponentTable {
        &self.components
    }

    /// The storage lock for `C`.
    #[inline]
    #[must_use]
    pub fn storage<C: Component>(&self) -> &RwLock<ComponentStorage<C>> {
        C::storage(&self.components)
    }

    /// Pre-sizes the registry and the storages of `ids`.
    pub fn reserve(&self, entities: usize, ids: &[ComponentId]) {
        self.entities.write().reserve(entities);
        for &id in ids {
            self.components.reserve(id, entities);
        }
    }

    /// Creates an entity with no components.
    ///
    /// # Errors
    ///
    /// `EntityLimit` once every entity index is in use.
    pub fn spawn(&self) -> EcsResult<EntityHandle> {
        self.entities.write().make_entity(None)
    }

    /// Adds a default `C` to `entity`.
    pub fn add_component<C: Component>(&self, entity: EntityHandle) -> EcsResult<ComponentHandle> {
        self.add_component_with(entity, C::default())
    }

    /// Adds `value` as `entity`'s `C` component.
    pub fn add_component_with<C: Component>(
        &self,
        entity: EntityHandle,
        value: C,
    ) -> EcsResult<ComponentHandle> {
        let mut entities = self.entities.write();
        let slot = entities.require_valid_mut(entity)?;
        if slot.has::<C>() {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: C::ID,
            });
        }
        let handle = self.storage::<C>().write().insert_value(entity, value)?;
        slot.components.insert(C::ID, handle);
        Ok(handle)
    }

    /// Checks if `entity` has a `C` component.
    #[must_use]
    pub fn has_component<C: Component>(&self, entity: EntityHandle) -> bool {
        self.entities
            .read()
            .get(entity)
            .is_some_and(|e| e.has::<C>())
    }

    /// Storage handle of `entity`'s `C` component.
    #[must_use]
    pub fn component_handle<C: Component>(&self, entity: EntityHandle) -> Option<ComponentHandle> {
        self.entities.read().component_handle::<C>(entity)
    }

    /// Runs `f` on `entity`'s `C` component, if present.
    pub fn with_component<C: Component, R>(
        &self,
        entity: EntityHandle,
        f: impl FnOnce(&C) -> R,
    ) -> Option<R> {
        let handle = self.component_handle::<C>(entity)?;
        let storage = self.storage::<C>().read();
        storage.get(handle).map(f)
    }

    /// Runs `f` on `entity`'s `C` component mutably, if present.
    pub fn with_component_mut<C: Component, R>(
        &self,
        entity: EntityHandle,
        f: impl FnOnce(&mut C) -> R,
    ) -> Option<R> {
        let handle = self.component_handle::<C>(entity)?;
        let mut storage = self.storage::<C>().write();
        storage.get_mut(handle).map(f)
    }

    /// Copy of `entity`'s `C` component.
    #[must_use]
    pub fn component<C: Component>(&self, entity: EntityHandle) -> Option<C> {
        self.with_component(entity, C::clone)
    }

    /// Returns true if `entity` exists and is still valid.
    #[must_use]
    pub fn is_valid(&self, entity: EntityHandle) -> bool {
        self.entities.read().get_valid(entity).is_some()
    }

    /// Marks `entity` dead without reclaiming anything.
    pub fn kill(&self, entity: EntityHandle) -> bool {
        match self.entities.write().get_mut(entity) {
            Some(e) if e.valid => {
                e.valid = false;
                true
            }
            _ => false,
        }
    }

    /// Invalidates `entity` and releases all its components.
    ///
    /// Returns the number of components released. Callers that placed the
    /// entity in a world must remove it from there first.
    pub fn despawn(&self, entity: EntityHandle) -> usize {
        let mut entities = self.entities.write();
        let Some(slot) = entities.get_mut(entity) else {
            return 0;
        };
        slot.valid = false;
        slot.components
            .drain()
            .filter(|(_, handle)| self.components.release(*handle))
            .count()
    }

    // =========================================================================
    // Prefabs
    // =========================================================================

    /// Registers an empty prefab.
    pub fn make_prefab(&self, name: &str) -> EcsResult<PrefabId> {
        self.entities.write().make_prefab(name)
    }

    /// Adds a `C` template to a prefab, replacing any previous one.
    ///
    /// A replaced template is overwritten in its existing slot, so the
    /// returned handle is unchanged.
    pub fn add_prefab_component<C: Component>(
        &self,
        prefab: PrefabId,
        mut value: C,
    ) -> EcsResult<ComponentHandle> {
        let mut entities = self.entities.write();
        let Some(template) = entities.prefab_mut(prefab) else {
            return Err(EcsError::UnknownPrefab(format!("#{}", prefab.0)));
        };
        let mut storage = self.storage::<C>().write();
        if let Some(handle) = template.handle_of::<C>() {
            if let Some(slot) = storage.prefab_mut(handle) {
                value.set_parent(EntityHandle::NULL);
                *slot = value;
                return Ok(handle);
            }
        }
        let handle = storage.insert_prefab(value)?;
        template.components.insert(C::ID, handle);
        Ok(handle)
    }

    /// Copy of a prefab's `C` template.
    #[must_use]
    pub fn prefab_component<C: Component>(&self, prefab: PrefabId) -> Option<C> {
        let handle = self.entities.read().prefab(prefab)?.handle_of::<C>()?;
        self.storage::<C>().read().prefab(handle).cloned()
    }

    /// Stamps a new entity from the prefab called `name`.
    pub fn spawn_from_prefab(&self, name: &str) -> EcsResult<EntityHandle> {
        let mut entities = self.entities.write();
        let id = entities
            .prefab_id(name)
            .ok_or_else(|| EcsError::UnknownPrefab(name.to_owned()))?;
        let templates: Vec<ComponentHandle> = entities
            .prefab(id)
            .map(|p| p.components.iter().map(|(_, h)| *h).collect())
            .unwrap_or_default();

        let handle = entities.make_entity(Some(id))?;
        let slot = entities.require_valid_mut(handle)?;
        for template in templates {
            if let Some(live) = self.components.instantiate(template, handle)? {
                slot.components.insert(live.kind(), live);
            }
        }
        Ok(handle)
    }

    /// Drops every entity and live component. Prefabs survive.
    pub fn clear(&self) {
        self.entities.write().clear();
        self.components.clear();
    }
}
