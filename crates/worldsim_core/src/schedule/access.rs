//! # Declared Resource Access
//!
//! Each system declares up front which shared resources it reads and
//! writes. The builder rejects two systems in the same phase when one
//! writes what the other touches, and the tick context refuses any lock
//! the system did not declare.

use std::fmt;

use crate::ecs::{Component, ComponentId};

/// A lockable piece of shared simulation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    /// The spatial world.
    World,
    /// The entity registry.
    Entities,
    /// One component storage.
    Component(ComponentId),
}

impl Resource {
    /// The storage resource for `C`.
    #[inline]
    #[must_use]
    pub const fn of<C: Component>() -> Self {
        Self::Component(C::ID)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::World => f.write_str("world"),
            Self::Entities => f.write_str("entities"),
            Self::Component(id) => write!(f, "{id} storage"),
        }
    }
}

/// The read and write sets of one system.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Access {
    reads: Vec<Resource>,
    writes: Vec<Resource>,
}

impl Access {
    /// Empty access set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Declares a read.
    #[must_use]
    pub fn reads(mut self, resource: Resource) -> Self {
        if !self.reads.contains(&resource) {
            self.reads.push(resource);
        }
        self
    }

    /// Declares a write. A write also permits reading.
    #[must_use]
    pub fn writes(mut self, resource: Resource) -> Self {
        if !self.writes.contains(&resource) {
            self.writes.push(resource);
        }
        self
    }

    /// Declares a read of `C`'s storage.
    #[must_use]
    pub fn read<C: Component>(self) -> Self {
        self.reads(Resource::of::<C>())
    }

    /// Declares a write of `C`'s storage.
    #[must_use]
    pub fn write<C: Component>(self) -> Self {
        self.writes(Resource::of::<C>())
    }

    /// Checks if reading `resource` was declared.
    #[inline]
    #[must_use]
    pub fn can_read(&self, resource: Resource) -> bool {
        self.reads.contains(&resource) || self.writes.contains(&resource)
    }

    /// Checks if writing `resource` was declared.
    #[inline]
    #[must_use]
    pub fn can_write(&self, resource: Resource) -> bool {
        self.writes.contains(&resource)
    }

    /// Declared reads.
    #[must_use]
    pub fn read_set(&self) -> &[Resource] {
        &self.reads
    }

    /// Declared writes.
    #[must_use]
    pub fn write_set(&self) -> &[Resource] {
        &self.writes
    }

    /// First resource one side writes and the other reads or writes.
    ///
    /// Two systems with no conflict can run concurrently and still give
    /// the same result in either order.
    #[must_use]
    pub fn conflict(&self, other: &Self) -> Option<Resource> {
        self.writes
            .iter()
            .copied()
            .find(|&r| other.can_read(r))
            .or_else(|| other.writes.iter().copied().find(|&r| self.can_read(r)))
    }
}
