//! # Component Storage
//!
//! Dense, per-type component storage.
//!
//! The storage uses a dense array strategy:
//! - Components live in one contiguous `Vec`, iterated in bulk by systems
//! - A parallel array records the owning entity of every slot
//! - Released slots go on a free list and are reused by the next insert
//! - Prefab templates live in a separate partition so instancing never
//!   shifts live indices
//!
//! A slot's index never changes while its component is alive.

use super::component::Component;
use super::handle::{next_index, ComponentHandle, EntityHandle};
use crate::error::{EcsError, EcsResult};

/// Storage for a single component type.
///
/// # Example
///
/// ```rust,ignore
/// let mut storage: ComponentStorage<Plant> = ComponentStorage::new();
/// let handle = storage.insert(entity)?;
/// storage.get_mut(handle).unwrap().fruit = 2;
/// ```
pub struct ComponentStorage<C: Component> {
    /// The dense array of components.
    data: Vec<C>,
    /// Owner of each slot; `EntityHandle::NULL` marks a free slot.
    owners: Vec<EntityHandle>,
    /// Generation of each slot, bumped on release.
    generations: Vec<u8>,
    /// Free list of released slot indices.
    free: Vec<u32>,
    /// Prefab partition.
    prefabs: Vec<C>,
}

impl<C: Component> Default for ComponentStorage<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Component> ComponentStorage<C> {
    /// Creates an empty storage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            owners: Vec::new(),
            generations: Vec::new(),
            free: Vec::new(),
            prefabs: Vec::new(),
        }
    }

    /// Pre-sizes the live partition for `additional` more components.
    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional);
        self.owners.reserve(additional);
        self.generations.reserve(additional);
    }

    /// Number of slots, live or free.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no slot was ever allocated.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of live components.
    #[inline]
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.data.len() - self.free.len()
    }

    /// Appends a default component owned by `owner`.
    ///
    /// # Errors
    ///
    /// `StorageFull` once every slot index is in use.
    pub fn insert(&mut self, owner: EntityHandle) -> EcsResult<ComponentHandle> {
        self.insert_value(owner, C::default())
    }

    /// Stores `value` as a component owned by `owner`.
    ///
    /// Reuses a released slot when one is available, otherwise appends.
    ///
    /// # Errors
    ///
    /// `StorageFull` once every slot index is in use.
    pub fn insert_value(
        &mut self,
        owner: EntityHandle,
        mut value: C,
    ) -> EcsResult<ComponentHandle> {
        value.set_parent(owner);

        if let Some(index) = self.free.pop() {
            let idx = index as usize;
            self.data[idx] = value;
            self.owners[idx] = owner;
            return Ok(ComponentHandle::new(C::ID, index, self.generations[idx]));
        }

        let index = next_index(self.data.len()).ok_or(EcsError::StorageFull(C::ID))?;
        self.data.push(value);
        self.owners.push(owner);
        self.generations.push(0);
        Ok(ComponentHandle::new(C::ID, index, 0))
    }

    /// Checks that `handle` names a live slot of this storage.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: ComponentHandle) -> bool {
        let idx = handle.index() as usize;
        handle.kind() == C::ID
            && !handle.is_prefab()
            && idx < self.data.len()
            && self.generations[idx] == handle.generation()
            && !self.owners[idx].is_null()
    }

    /// Gets a component by handle.
    ///
    /// Returns `None` for a handle of another type, a prefab handle, or a
    /// stale generation.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: ComponentHandle) -> Option<&C> {
        if self.contains(handle) {
            Some(&self.data[handle.index() as usize])
        } else {
            None
        }
    }

    /// Gets a mutable component by handle.
    #[inline]
    pub fn get_mut(&mut self, handle: ComponentHandle) -> Option<&mut C> {
        if self.contains(handle) {
            Some(&mut self.data[handle.index() as usize])
        } else {
            None
        }
    }

    /// Direct slot access with no generation check.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    #[must_use]
    pub fn slot(&self, index: usize) -> &C {
        &self.data[index]
    }

    /// Direct mutable slot access with no generation check.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn slot_mut(&mut self, index: usize) -> &mut C {
        &mut self.data[index]
    }

    /// Owner of slot `index`, `NULL` if the slot is free or out of range.
    #[inline]
    #[must_use]
    pub fn owner(&self, index: usize) -> EntityHandle {
        self.owners.get(index).copied().unwrap_or(EntityHandle::NULL)
    }

    /// The parallel owner array.
    #[inline]
    #[must_use]
    pub fn owners(&self) -> &[EntityHandle] {
        &self.owners
    }

    /// The whole dense array, free slots included.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.data
    }

    /// The whole dense array, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [C] {
        &mut self.data
    }

    /// Splits into the mutable dense array and the owner array.
    ///
    /// Lets bulk passes skip free slots while writing components.
    #[inline]
    pub fn split_mut(&mut self) -> (&mut [C], &[EntityHandle]) {
        (&mut self.data, &self.owners)
    }

    /// Iterates over live components with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &C)> {
        self.data
            .iter()
            .zip(self.owners.iter())
            .enumerate()
            .filter(|(_, (_, owner))| !owner.is_null())
            .map(|(idx, (c, _))| (idx, c))
    }

    /// Iterates mutably over live components with their indices.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut C)> {
        self.data
            .iter_mut()
            .zip(self.owners.iter())
            .enumerate()
            .filter(|(_, (_, owner))| !owner.is_null())
            .map(|(idx, (c, _))| (idx, c))
    }

    /// Releases a live slot to the free list.
    ///
    /// Bumps the slot generation so outstanding handles go stale.
    /// Returns the released value, or `None` if the handle was not live.
    pub fn release(&mut self, handle: ComponentHandle) -> Option<C> {
        if !self.contains(handle) {
            return None;
        }
        let idx = handle.index() as usize;
        let value = std::mem::take(&mut self.data[idx]);
        self.owners[idx] = EntityHandle::NULL;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free.push(handle.index());
        Some(value)
    }

    /// Drops every live component. Prefabs are kept.
    pub fn clear(&mut self) {
        self.data.clear();
        self.owners.clear();
        self.generations.clear();
        self.free.clear();
    }

    // =========================================================================
    // Prefab partition
    // =========================================================================

    /// Stores a prefab template value.
    ///
    /// # Errors
    ///
    /// `StorageFull` once every prefab slot index is in use.
    pub fn insert_prefab(&mut self, mut value: C) -> EcsResult<ComponentHandle> {
        value.set_parent(EntityHandle::NULL);
        let index = next_index(self.prefabs.len()).ok_or(EcsError::StorageFull(C::ID))?;
        self.prefabs.push(value);
        Ok(ComponentHandle::prefab(C::ID, index))
    }

    /// Gets a prefab template by handle.
    #[inline]
    #[must_use]
    pub fn prefab(&self, handle: ComponentHandle) -> Option<&C> {
        if handle.kind() != C::ID || !handle.is_prefab() {
            return None;
        }
        self.prefabs.get(handle.index() as usize)
    }

    /// Gets a mutable prefab template by handle.
    #[inline]
    pub fn prefab_mut(&mut self, handle: ComponentHandle) -> Option<&mut C> {
        if handle.kind() != C::ID || !handle.is_prefab() {
            return None;
        }
        self.prefabs.get_mut(handle.index() as usize)
    }

    /// Number of prefab templates.
    #[inline]
    #[must_use]
    pub fn prefab_count(&self) -> usize {
        self.prefabs.len()
    }

    /// Copies a prefab template into the live partition for `owner`.
    ///
    /// `Ok(None)` if `prefab` is not a template of this storage.
    ///
    /// # Errors
    ///
    /// `StorageFull` once every slot index is in use.
    pub fn instantiate(
        &mut self,
        prefab: ComponentHandle,
        owner: EntityHandle,
    ) -> EcsResult<Option<ComponentHandle>> {
        let Some(value) = self.prefab(prefab).cloned() else {
            return Ok(None);
        };
        self.insert_value(owner, value).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{Plant, Position};
    use crate::ecs::handle::ComponentId;

    #[test]
    fn test_insert_assigns_sequential_indices() {
        let mut storage: ComponentStorage<Position> = ComponentStorage::new();
        let a = storage.insert(EntityHandle::new(0, 0)).unwrap();
        let b = storage.insert(EntityHandle::new(1, 0)).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(a.kind(), ComponentId::Position);
        assert_eq!(storage.owner(1), EntityHandle::new(1, 0));
        assert_eq!(storage.get(b).unwrap().parent, EntityHandle::new(1, 0));
    }

    #[test]
    fn test_release_recycles_slot_with_new_generation() {
        let mut storage: ComponentStorage<Plant> = ComponentStorage::new();
        let first = storage.insert(EntityHandle::new(0, 0)).unwrap();
        let kept = storage.insert(EntityHandle::new(1, 0)).unwrap();

        assert!(storage.release(first).is_some());
        assert!(storage.get(first).is_none());
        assert!(storage.release(first).is_none());
        assert_eq!(storage.live_count(), 1);

        let reused = storage.insert(EntityHandle::new(2, 0)).unwrap();
        assert_eq!(reused.index(), first.index());
        assert_ne!(reused.generation(), first.generation());
        assert!(storage.get(first).is_none());
        assert!(storage.get(reused).is_some());
        assert_eq!(storage.get(kept).unwrap().parent, EntityHandle::new(1, 0));
    }

    #[test]
    fn test_iter_skips_free_slots() {
        let mut storage: ComponentStorage<Plant> = ComponentStorage::new();
        let handles: Vec<_> = (0..4)
            .map(|i| storage.insert(EntityHandle::new(i, 0)).unwrap())
            .collect();
        storage.release(handles[1]);

        let indices: Vec<usize> = storage.iter().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![0, 2, 3]);
        assert_eq!(storage.iter_mut().count(), 3);
    }

    #[test]
    fn test_wrong_kind_handle_rejected() {
        let mut storage: ComponentStorage<Plant> = ComponentStorage::new();
        storage.insert(EntityHandle::new(0, 0)).unwrap();
        let foreign = ComponentHandle::new(ComponentId::Position, 0, 0);
        assert!(storage.get(foreign).is_none());
    }

    #[test]
    fn test_prefab_partition_is_disjoint() {
        let mut storage: ComponentStorage<Plant> = ComponentStorage::new();
        let template = storage
            .insert_prefab(Plant {
                max_fruit: 9,
                ..Plant::default()
            })
            .unwrap();
        assert!(storage.is_empty());
        assert!(storage.get(template).is_none());

        let live = storage.instantiate(template, EntityHandle::new(4, 0)).unwrap().unwrap();
        assert_eq!(live.index(), 0);
        assert_eq!(storage.get(live).unwrap().max_fruit, 9);
        assert_eq!(storage.get(live).unwrap().parent, EntityHandle::new(4, 0));
        assert!(storage.prefab(template).unwrap().parent.is_null());
    }
}
