//! # Systems
//!
//! Per-tick logic. Each system works over one component type's dense
//! array and declares every shared resource it touches.

mod actor;
mod creature;
mod movable;
mod plant;

pub use actor::ActorSystem;
pub use creature::CreatureSystem;
pub use movable::MovableSystem;
pub use plant::PlantSystem;

use crate::error::ScheduleResult;
use crate::schedule::{Access, TickContext};

/// A unit of per-tick work.
///
/// `process` runs once per tick on a scheduler worker, concurrently with
/// the other systems. It may only lock what `access` declares.
pub trait System: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Resources this system reads and writes.
    fn access(&self) -> Access;

    /// Runs one pass.
    ///
    /// # Errors
    ///
    /// `UndeclaredAccess` for a lock outside `access`, or any failure the
    /// system itself reports.
    fn process(&self, ctx: &TickContext<'_>) -> ScheduleResult<()>;
}
