//! # World Chunks
//!
//! The world is partitioned into square chunks. Each chunk owns:
//! - A dense terrain grid
//! - An occupancy bitset of the same size
//! - A second bitset marking tiles that hold more than one entity
//! - An unordered list of the entities standing in it

use super::occupancy::OccupancyGrid;
use super::terrain::Terrain;
use crate::ecs::EntityHandle;

/// Default chunk side length in tiles. 1 tile = 1 meter.
pub const CHUNK_SIZE: u32 = 250;

/// Chunk coordinate (in chunks, not tiles).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    /// X coordinate in chunks.
    pub x: u32,
    /// Y coordinate in chunks.
    pub y: u32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// One square partition of the world.
#[derive(Clone, Debug)]
pub struct WorldChunk {
    coord: ChunkCoord,
    size: u32,
    terrain: Vec<Terrain>,
    blocked: OccupancyGrid,
    stacked: OccupancyGrid,
    entities: Vec<EntityHandle>,
}

impl WorldChunk {
    /// Creates a chunk filled with `fill`.
    #[must_use]
    pub fn new(coord: ChunkCoord, size: u32, fill: Terrain) -> Self {
        Self {
            coord,
            size,
            terrain: vec![fill; size as usize * size as usize],
            blocked: OccupancyGrid::new(size),
            stacked: OccupancyGrid::new(size),
            entities: Vec::new(),
        }
    }

    /// This chunk's coordinate.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Side length in tiles.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    fn tile_index(&self, local_x: u32, local_y: u32) -> usize {
        local_y as usize * self.size as usize + local_x as usize
    }

    /// Terrain at a chunk-local tile.
    #[inline]
    #[must_use]
    pub fn terrain(&self, local_x: u32, local_y: u32) -> &Terrain {
        &self.terrain[self.tile_index(local_x, local_y)]
    }

    /// Mutable terrain at a chunk-local tile.
    #[inline]
    pub fn terrain_mut(&mut self, local_x: u32, local_y: u32) -> &mut Terrain {
        let idx = self.tile_index(local_x, local_y);
        &mut self.terrain[idx]
    }

    /// The whole terrain grid, row-major.
    #[inline]
    #[must_use]
    pub fn terrain_grid(&self) -> &[Terrain] {
        &self.terrain
    }

    /// The occupancy bitset.
    #[inline]
    #[must_use]
    pub const fn blocked(&self) -> &OccupancyGrid {
        &self.blocked
    }

    /// Checks if a chunk-local tile is blocked.
    #[inline]
    #[must_use]
    pub fn is_blocked(&self, local_x: u32, local_y: u32) -> bool {
        self.blocked.get(local_x, local_y)
    }

    /// Sets or clears a chunk-local tile's blocked bit.
    #[inline]
    pub fn set_blocked(&mut self, local_x: u32, local_y: u32, blocked: bool) {
        self.blocked.set(local_x, local_y, blocked);
    }

    /// Checks if a chunk-local tile holds more than one entity.
    ///
    /// Only placement can stack entities; movement never enters a
    /// blocked tile.
    #[inline]
    #[must_use]
    pub fn is_stacked(&self, local_x: u32, local_y: u32) -> bool {
        self.stacked.get(local_x, local_y)
    }

    /// Sets or clears a chunk-local tile's stacked bit.
    #[inline]
    pub fn set_stacked(&mut self, local_x: u32, local_y: u32, stacked: bool) {
        self.stacked.set(local_x, local_y, stacked);
    }

    /// Entities resident in this chunk.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[EntityHandle] {
        &self.entities
    }

    /// Adds a resident.
    #[inline]
    pub fn push_entity(&mut self, entity: EntityHandle) {
        self.entities.push(entity);
    }

    /// Removes a resident by linear scan.
    ///
    /// Returns true if the entity was found.
    pub fn remove_entity(&mut self, entity: EntityHandle) -> bool {
        if let Some(at) = self.entities.iter().position(|&e| e == entity) {
            self.entities.swap_remove(at);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_fill() {
        let chunk = WorldChunk::new(ChunkCoord::new(1, 2), 16, Terrain::GRASS);
        assert_eq!(chunk.terrain_grid().len(), 256);
        assert_eq!(*chunk.terrain(15, 15), Terrain::GRASS);
        assert_eq!(chunk.coord(), ChunkCoord::new(1, 2));
    }

    #[test]
    fn test_resident_list() {
        let mut chunk = WorldChunk::new(ChunkCoord::default(), 4, Terrain::GRASS);
        let a = EntityHandle::new(1, 0);
        let b = EntityHandle::new(2, 0);
        chunk.push_entity(a);
        chunk.push_entity(b);
        assert!(chunk.remove_entity(a));
        assert!(!chunk.remove_entity(a));
        assert_eq!(chunk.entities(), &[b]);
    }
}
