//! # Entity Management
//!
//! Entities are dense registry slots. An entity does not own component data;
//! it owns a [`CompactMap`] from component type to the handle of that
//! type's storage slot.

use std::collections::HashMap;

use super::compact_map::CompactMap;
use super::component::Component;
use super::handle::{next_index, ComponentHandle, ComponentId, EntityHandle};
use crate::error::{EcsError, EcsResult};

/// Index of a prefab in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrefabId(pub u16);

/// A registry slot.
#[derive(Clone, Debug)]
pub struct Entity {
    /// False once the entity died. Dead entities are reaped after the tick.
    pub valid: bool,
    /// This entity's handle.
    pub handle: EntityHandle,
    /// Prefab this entity was stamped from.
    pub prefab: Option<PrefabId>,
    /// Component type to storage slot.
    pub components: CompactMap<ComponentId, ComponentHandle>,
}

impl Entity {
    /// Creates a live entity with no components.
    #[must_use]
    pub const fn new(handle: EntityHandle, prefab: Option<PrefabId>) -> Self {
        Self {
            valid: true,
            handle,
            prefab,
            components: CompactMap::new(),
        }
    }

    /// Checks if this entity has a `C` component.
    #[inline]
    #[must_use]
    pub fn has<C: Component>(&self) -> bool {
        self.components.contains_key(&C::ID)
    }

    /// Checks if this entity has a component of type `id`.
    #[inline]
    #[must_use]
    pub fn has_id(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    /// Storage handle of this entity's `C` component.
    #[inline]
    #[must_use]
    pub fn handle_of<C: Component>(&self) -> Option<ComponentHandle> {
        self.components.get(&C::ID).copied()
    }
}

/// A named template of default component values.
///
/// Its values live in the prefab partition of each storage.
#[derive(Clone, Debug)]
pub struct Prefab {
    /// Registry index.
    pub id: PrefabId,
    /// Lookup name.
    pub name: String,
    /// Component type to prefab-partition handle.
    pub components: CompactMap<ComponentId, ComponentHandle>,
}

impl Prefab {
    /// Checks if this prefab has a `C` template.
    #[inline]
    #[must_use]
    pub fn has<C: Component>(&self) -> bool {
        self.components.contains_key(&C::ID)
    }

    /// Prefab-partition handle of the `C` template.
    #[inline]
    #[must_use]
    pub fn handle_of<C: Component>(&self) -> Option<ComponentHandle> {
        self.components.get(&C::ID).copied()
    }
}

/// Dense entity registry plus the prefab table.
#[derive(Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    prefabs: Vec<Prefab>,
    prefab_names: HashMap<String, PrefabId>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-sizes for `additional` more entities.
    pub fn reserve(&mut self, additional: usize) {
        self.entities.reserve(additional);
    }

    /// Number of slots ever allocated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity was ever created.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of entities still valid.
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.entities.iter().filter(|e| e.valid).count()
    }

    /// Appends a new entity.
    ///
    /// # Errors
    ///
    /// `EntityLimit` once every entity index is in use.
    pub fn make_entity(&mut self, prefab: Option<PrefabId>) -> EcsResult<EntityHandle> {
        let index = next_index(self.entities.len())
            .ok_or(EcsError::EntityLimit(self.entities.len()))?;
        let handle = EntityHandle::new(index, 0);
        self.entities.push(Entity::new(handle, prefab));
        Ok(handle)
    }

    /// Gets an entity by handle, valid or not.
    ///
    /// Returns `None` for a null, out-of-range, or stale handle.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        let entity = self.entities.get(handle.index() as usize)?;
        (entity.handle.generation() == handle.generation()).then_some(entity)
    }

    /// Gets a mutable entity by handle, valid or not.
    #[inline]
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        let entity = self.entities.get_mut(handle.index() as usize)?;
        if entity.handle.generation() == handle.generation() {
            Some(entity)
        } else {
            None
        }
    }

    /// Gets an entity only if it is still valid.
    #[inline]
    #[must_use]
    pub fn get_valid(&self, handle: EntityHandle) -> Option<&Entity> {
        self.get(handle).filter(|e| e.valid)
    }

    /// Like [`get_valid`](Self::get_valid), as an error.
    pub fn require_valid_mut(&mut self, handle: EntityHandle) -> EcsResult<&mut Entity> {
        match self.get_mut(handle) {
            Some(entity) if entity.valid => Ok(entity),
            _ => Err(EcsError::StaleEntity(handle)),
        }
    }

    /// Storage handle of `C` on `entity`, if both exist.
    #[inline]
    #[must_use]
    pub fn component_handle<C: Component>(&self, entity: EntityHandle) -> Option<ComponentHandle> {
        self.get(entity)?.handle_of::<C>()
    }

    /// Iterates over every slot.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Handles of entities that died but still hold components.
    #[must_use]
    pub fn dead_with_components(&self) -> Vec<EntityHandle> {
        self.entities
            .iter()
            .filter(|e| !e.valid && !e.components.is_empty())
            .map(|e| e.handle)
            .collect()
    }

    /// Drops every entity. Prefabs are kept.
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    // =========================================================================
    // Prefabs
    // =========================================================================

    /// Registers an empty prefab under `name`.
    pub fn make_prefab(&mut self, name: &str) -> EcsResult<PrefabId> {
        if self.prefab_names.contains_key(name) {
            return Err(EcsError::DuplicatePrefab(name.to_owned()));
        }
        let raw = u16::try_from(self.prefabs.len())
            .map_err(|_| EcsError::PrefabLimit(self.prefabs.len()))?;
        let id = PrefabId(raw);
        self.prefabs.push(Prefab {
            id,
            name: name.to_owned(),
            components: CompactMap::new(),
        });
        self.prefab_names.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Looks a prefab up by name.
    #[must_use]
    pub fn prefab_id(&self, name: &str) -> Option<PrefabId> {
        self.prefab_names.get(name).copied()
    }

    /// Gets a prefab.
    #[must_use]
    pub fn prefab(&self, id: PrefabId) -> Option<&Prefab> {
        self.prefabs.get(usize::from(id.0))
    }

    /// Gets a mutable prefab.
    pub fn prefab_mut(&mut self, id: PrefabId) -> Option<&mut Prefab> {
        self.prefabs.get_mut(usize::from(id.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{Plant, Position};

    #[test]
    fn test_make_entity_handles_are_dense() {
        let mut registry = EntityRegistry::new();
        let a = registry.make_entity(None).unwrap();
        let b = registry.make_entity(None).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(a).unwrap().valid);
    }

    #[test]
    fn test_stale_generation_rejected() {
        let mut registry = EntityRegistry::new();
        let a = registry.make_entity(None).unwrap();
        let stale = EntityHandle::new(a.index(), a.generation().wrapping_add(1));
        assert!(registry.get(stale).is_none());
        assert!(registry.get(EntityHandle::NULL).is_none());
    }

    #[test]
    fn test_capability_query() {
        let mut registry = EntityRegistry::new();
        let a = registry.make_entity(None).unwrap();
        let handle = ComponentHandle::new(ComponentId::Position, 0, 0);
        registry
            .get_mut(a)
            .unwrap()
            .components
            .insert(ComponentId::Position, handle);

        let entity = registry.get(a).unwrap();
        assert!(entity.has::<Position>());
        assert!(!entity.has::<Plant>());
        assert_eq!(registry.component_handle::<Position>(a), Some(handle));
        assert_eq!(registry.component_handle::<Plant>(a), None);
    }

    #[test]
    fn test_prefab_names_unique() {
        let mut registry = EntityRegistry::new();
        let id = registry.make_prefab("plant").unwrap();
        assert_eq!(registry.prefab_id("plant"), Some(id));
        assert_eq!(
            registry.make_prefab("plant"),
            Err(EcsError::DuplicatePrefab("plant".to_owned()))
        );
        assert_eq!(registry.prefab(id).unwrap().name, "plant");
    }

    #[test]
    fn test_dead_with_components() {
        let mut registry = EntityRegistry::new();
        let a = registry.make_entity(None).unwrap();
        let b = registry.make_entity(None).unwrap();
        for h in [a, b] {
            registry
                .get_mut(h)
                .unwrap()
                .components
                .insert(ComponentId::Plant, ComponentHandle::new(ComponentId::Plant, h.index(), 0));
        }
        registry.get_mut(b).unwrap().valid = false;
        assert_eq!(registry.dead_with_components(), vec![b]);
        assert_eq!(registry.valid_count(), 1);
    }
}
