//! # Component System
//!
//! Components are plain data records with no behavior. Every component
//! carries a back-reference to its owning entity; scheduled components also
//! carry a `schedule` tick marker reserved for staggered updates.

use std::collections::VecDeque;

use bytemuck::{Pod, Zeroable};
use parking_lot::RwLock;

use super::handle::{ComponentId, EntityHandle};
use super::storage::ComponentStorage;
use super::table::ComponentTable;

/// Marker trait for ECS components.
///
/// Components must be:
/// - `Clone`: prefab instancing copies the template value
/// - `Default`: storage appends default-constructed values
/// - `Send + Sync`: storages are shared across worker threads
pub trait Component: Clone + Default + Send + Sync + 'static {
    /// Type tag for this component.
    const ID: ComponentId;

    /// Owning entity.
    fn parent(&self) -> EntityHandle;

    /// Sets the owning entity.
    fn set_parent(&mut self, parent: EntityHandle);

    /// Locates this type's storage inside a component table.
    fn storage(table: &ComponentTable) -> &RwLock<ComponentStorage<Self>>;
}

macro_rules! impl_component {
    ($ty:ty, $id:ident, $field:ident) => {
        impl Component for $ty {
            const ID: ComponentId = ComponentId::$id;

            #[inline]
            fn parent(&self) -> EntityHandle {
                self.parent
            }

            #[inline]
            fn set_parent(&mut self, parent: EntityHandle) {
                self.parent = parent;
            }

            #[inline]
            fn storage(table: &ComponentTable) -> &RwLock<ComponentStorage<Self>> {
                &table.$field
            }
        }
    };
}

/// Display name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Name {
    /// Owning entity.
    pub parent: EntityHandle,
    /// The name.
    pub name: String,
}

impl_component!(Name, Name, names);

/// Tile position.
///
/// `Pod` so resident positions can be handed to a renderer as raw bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Position {
    /// Owning entity.
    pub parent: EntityHandle,
    /// X tile coordinate.
    pub x: i32,
    /// Y tile coordinate.
    pub y: i32,
    /// Z level.
    pub z: i32,
}

impl_component!(Position, Position, positions);

impl Position {
    /// Creates an unowned position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self {
            parent: EntityHandle::NULL,
            x,
            y,
            z,
        }
    }

    /// Returns true if both positions name the same tile.
    #[inline]
    #[must_use]
    pub const fn same_tile(&self, x: i32, y: i32) -> bool {
        self.x == x && self.y == y
    }

    /// Returns the squared distance to another position.
    ///
    /// Avoids the sqrt for nearest-neighbour comparisons.
    #[inline]
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> u64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        let dz = i64::from(self.z) - i64::from(other.z);
        dx.unsigned_abs().pow(2) + dy.unsigned_abs().pow(2) + dz.unsigned_abs().pow(2)
    }

    /// Euclidean distance.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn distance(&self, other: &Self) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }
}

/// Marks an entity the movable system steps every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Movable {
    /// Owning entity.
    pub parent: EntityHandle,
    /// Reserved for staggered scheduling.
    pub schedule: u64,
}

impl_component!(Movable, Movable, movables);

/// Fruit-bearing plant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Plant {
    /// Owning entity.
    pub parent: EntityHandle,
    /// Reserved for staggered scheduling.
    pub schedule: u64,
    /// Ripe fruit currently on the plant.
    pub fruit: u8,
    /// Cap on `fruit`.
    pub max_fruit: u8,
    /// Ticks since the last fruit.
    pub growth_status: u16,
    /// Ticks needed to grow one fruit.
    pub growth_time: u16,
}

impl Default for Plant {
    fn default() -> Self {
        Self {
            parent: EntityHandle::NULL,
            schedule: 0,
            fruit: 0,
            max_fruit: 3,
            growth_status: 0,
            growth_time: 100,
        }
    }
}

impl_component!(Plant, Plant, plants);

impl Plant {
    /// Advances growth by one tick.
    ///
    /// Returns true if a fruit was added.
    #[inline]
    pub fn grow(&mut self) -> bool {
        self.growth_status = self.growth_status.saturating_add(1);
        if self.growth_status < self.growth_time {
            return false;
        }
        self.growth_status = 0;
        if self.fruit < self.max_fruit {
            self.fruit += 1;
            true
        } else {
            false
        }
    }
}

/// Carried resources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    /// Owning entity.
    pub parent: EntityHandle,
    /// Food units carried.
    pub food: i8,
}

impl_component!(Inventory, Inventory, inventories);

/// A living thing that starves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Creature {
    /// Owning entity.
    pub parent: EntityHandle,
    /// Reserved for staggered scheduling.
    pub schedule: u64,
    /// Hunger level past which the creature dies.
    pub eating_time: u16,
    /// Ticks since the creature last ate.
    pub hunger: u16,
}

impl Default for Creature {
    fn default() -> Self {
        Self {
            parent: EntityHandle::NULL,
            schedule: 0,
            eating_time: 250,
            hunger: 0,
        }
    }
}

impl_component!(Creature, Creature, creatures);

impl Creature {
    /// Returns true once hunger has passed the eating threshold.
    #[inline]
    #[must_use]
    pub const fn is_starved(&self) -> bool {
        self.hunger > self.eating_time
    }
}

/// What an actor is currently doing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Action {
    /// Nothing decided yet.
    #[default]
    None,
    /// Deliberately waiting.
    Idle,
    /// Heading for `target`.
    Move,
    /// Harvesting `target`.
    Harvest,
}

/// Decision-making state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Actor {
    /// Owning entity.
    pub parent: EntityHandle,
    /// Reserved for staggered scheduling.
    pub schedule: u64,
    /// Current action.
    pub action: Action,
    /// Entity the action is aimed at.
    pub target: EntityHandle,
}

impl_component!(Actor, Actor, actors);

/// A single pathfinding step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Waypoint {
    /// X tile coordinate.
    pub x: i32,
    /// Y tile coordinate.
    pub y: i32,
}

/// Pending route for a moving entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pathfinding {
    /// Owning entity.
    pub parent: EntityHandle,
    /// Reserved for staggered scheduling.
    pub schedule: u64,
    /// Waypoints still to visit, front first.
    pub path: VecDeque<Waypoint>,
}

impl_component!(Pathfinding, Pathfinding, pathfinding);

impl Pathfinding {
    /// Appends a waypoint to the end of the route.
    pub fn push_waypoint(&mut self, x: i32, y: i32) {
        self.path.push_back(Waypoint { x, y });
    }

    /// Pops the next waypoint.
    pub fn next_waypoint(&mut self) -> Option<Waypoint> {
        self.path.pop_front()
    }
}
