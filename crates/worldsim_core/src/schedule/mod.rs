//! # Scheduling
//!
//! Drives systems tick by tick on a fixed worker pool, one phase after
//! another.
//!
//! ## Access rules
//!
//! - Within a phase, no system may write a resource another system reads
//!   or writes
//! - A system may only lock what it declared
//! - Deaths are deferred to the end of the phase

mod access;
mod context;
mod game;
mod stats;

pub use access::{Access, Resource};
pub use context::TickContext;
pub use game::{Game, GameBuilder, SystemState};
pub use stats::TickStats;
