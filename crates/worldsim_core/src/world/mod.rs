//! # Spatial World
//!
//! A 2-D tile grid split into fixed-size chunks. Each chunk owns its
//! terrain, an occupancy bitset and the list of entities standing in it.
//!
//! ```text
//! World (width x height tiles)
//! ├── WorldChunk (0,0) ── terrain | blocked | stacked | residents
//! ├── WorldChunk (1,0)
//! └── ...
//! ```

mod chunk;
mod grid;
mod occupancy;
mod populate;
mod terrain;

pub use chunk::{ChunkCoord, WorldChunk, CHUNK_SIZE};
pub use grid::{positions_as_bytes, EcsView, World, WorldStats};
pub use occupancy::OccupancyGrid;
pub use populate::{PopulationReport, ACTOR_PREFAB, PLANT_PREFAB};
pub use terrain::{Terrain, TerrainKind};
