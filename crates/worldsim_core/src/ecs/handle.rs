//! # Handles
//!
//! Entities and components are never referenced by pointer. Every reference
//! that outlives a single borrow is one of the handles in this module:
//! - An index into a dense array
//! - A generation counter for detecting stale references

use bytemuck::{Pod, Zeroable};

/// Component type tag.
///
/// The declaration order is meaningful: it is the sort order of every
/// entity's component map and the global lock order for component storages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ComponentId {
    /// No component. Tags the null handle.
    None = 0,
    /// Display name.
    Name,
    /// Tile position.
    Position,
    /// Can be moved by the movable system.
    Movable,
    /// Grows fruit over time.
    Plant,
    /// Carried food.
    Inventory,
    /// Gets hungry and dies.
    Creature,
    /// Makes decisions.
    Actor,
    /// Pending waypoints.
    Pathfinding,
}

impl ComponentId {
    /// Every real component type, in lock order.
    pub const ALL: [Self; 8] = [
        Self::Name,
        Self::Position,
        Self::Movable,
        Self::Plant,
        Self::Inventory,
        Self::Creature,
        Self::Actor,
        Self::Pathfinding,
    ];

    /// Lowercase name, used in logs and error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Name => "name",
            Self::Position => "position",
            Self::Movable => "movable",
            Self::Plant => "plant",
            Self::Inventory => "inventory",
            Self::Creature => "creature",
            Self::Actor => "actor",
            Self::Pathfinding => "pathfinding",
        }
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Unique identifier for an entity.
///
/// `#[repr(C)]` with explicit padding so it is `Pod` and exactly 8 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct EntityHandle {
    index: u32,
    generation: u8,
    _reserved: [u8; 3],
}

impl EntityHandle {
    /// Null/invalid entity handle.
    pub const NULL: Self = Self::new(u32::MAX, u8::MAX);

    /// Creates a new entity handle from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u8) -> Self {
        Self {
            index,
            generation,
            _reserved: [0; 3],
        }
    }

    /// Returns the index into the entity registry.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u8 {
        self.generation
    }

    /// Checks if this handle is null.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u32::MAX
    }
}

impl Default for EntityHandle {
    fn default() -> Self {
        Self::NULL
    }
}

impl std::fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            f.write_str("entity(null)")
        } else {
            write!(f, "entity({}v{})", self.index, self.generation)
        }
    }
}

/// Per-handle flag bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ComponentFlags(u8);

impl ComponentFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// The handle points into the prefab partition of its storage.
    pub const PREFAB: Self = Self(1);

    /// Returns true if every bit in `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Index for a slot appended after `len` existing ones.
///
/// `None` once the `u32` index space is used up; `u32::MAX` is reserved
/// for null handles.
#[inline]
pub(crate) fn next_index(len: usize) -> Option<u32> {
    u32::try_from(len).ok().filter(|&index| index != u32::MAX)
}

/// Reference to one slot of one component type's storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct ComponentHandle {
    kind: ComponentId,
    flags: ComponentFlags,
    generation: u8,
    index: u32,
}

impl ComponentHandle {
    /// Null component handle.
    pub const NULL: Self = Self {
        kind: ComponentId::None,
        flags: ComponentFlags::NONE,
        generation: 0,
        index: u32::MAX,
    };

    /// Creates a handle into the live partition.
    #[inline]
    #[must_use]
    pub const fn new(kind: ComponentId, index: u32, generation: u8) -> Self {
        Self {
            kind,
            flags: ComponentFlags::NONE,
            generation,
            index,
        }
    }

    /// Creates a handle into the prefab partition.
    #[inline]
    #[must_use]
    pub const fn prefab(kind: ComponentId, index: u32) -> Self {
        Self {
            kind,
            flags: ComponentFlags::PREFAB,
            generation: 0,
            index,
        }
    }

    /// Component type this handle belongs to.
    #[inline]
    #[must_use]
    pub const fn kind(self) -> ComponentId {
        self.kind
    }

    /// Flag bits.
    #[inline]
    #[must_use]
    pub const fn flags(self) -> ComponentFlags {
        self.flags
    }

    /// Generation of the slot when the handle was issued.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u8 {
        self.generation
    }

    /// Index into the storage partition.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Checks if this handle points into the prefab partition.
    #[inline]
    #[must_use]
    pub const fn is_prefab(self) -> bool {
        self.flags.contains(ComponentFlags::PREFAB)
    }

    /// Checks if this handle is null.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        matches!(self.kind, ComponentId::None)
    }
}

impl Default for ComponentHandle {
    fn default() -> Self {
        Self::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_index_stops_before_null() {
        assert_eq!(next_index(0), Some(0));
        assert_eq!(next_index(u32::MAX as usize - 1), Some(u32::MAX - 1));
        assert_eq!(next_index(u32::MAX as usize), None);
        assert_eq!(next_index(usize::MAX), None);
    }

    #[test]
    fn test_entity_handle_roundtrip() {
        let h = EntityHandle::new(12345, 7);
        assert_eq!(h.index(), 12345);
        assert_eq!(h.generation(), 7);
        assert!(!h.is_null());
        assert!(EntityHandle::default().is_null());
    }

    #[test]
    fn test_handle_sizes() {
        assert_eq!(std::mem::size_of::<EntityHandle>(), 8);
        assert_eq!(std::mem::size_of::<ComponentHandle>(), 8);
        assert_eq!(std::mem::size_of::<ComponentId>(), 1);
    }

    #[test]
    fn test_component_handle_flags() {
        let live = ComponentHandle::new(ComponentId::Plant, 3, 1);
        let prefab = ComponentHandle::prefab(ComponentId::Plant, 3);
        assert!(!live.is_prefab());
        assert!(prefab.is_prefab());
        assert_ne!(live, prefab);
        assert!(ComponentHandle::default().is_null());
    }

    #[test]
    fn test_component_id_order() {
        let mut ids = ComponentId::ALL;
        ids.sort();
        assert_eq!(ids, ComponentId::ALL);
        assert!(ComponentId::Position < ComponentId::Actor);
    }
}
