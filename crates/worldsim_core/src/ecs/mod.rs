//! # Entity Component System
//!
//! Handle-based entity and component storage.
//!
//! ## Design Philosophy
//!
//! - Components are stored in dense per-type arrays for bulk iteration
//! - Entities and components are referenced by generation-checked handles
//! - Each entity maps component types to storage slots with a `CompactMap`
//! - No global state: everything hangs off an explicit [`Ecs`] context

mod compact_map;
mod component;
mod context;
mod entity;
mod handle;
mod storage;
mod table;

pub use compact_map::CompactMap;
pub use component::{
    Action, Actor, Component, Creature, Inventory, Movable, Name, Pathfinding, Plant, Position,
    Waypoint,
};
pub use context::Ecs;
pub use entity::{Entity, EntityRegistry, Prefab, PrefabId};
pub use handle::{ComponentFlags, ComponentHandle, ComponentId, EntityHandle};
pub use storage::ComponentStorage;
pub use table::ComponentTable;
