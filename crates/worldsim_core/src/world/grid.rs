//! # World Grid
//!
//! A 2-D grid of chunks covering `[0, width) x [0, height)`.
//!
//! Chunk membership and occupancy are kept in exact sync with entity
//! positions: a tile is blocked iff some entity stands on it, and every
//! resident of a chunk has a position inside that chunk.

use super::chunk::{ChunkCoord, WorldChunk, CHUNK_SIZE};
use super::terrain::Terrain;
use crate::ecs::{Component, ComponentStorage, EntityHandle, EntityRegistry, Plant, Position};
use crate::error::{WorldError, WorldResult};

/// Read-only view of the entity data the world needs for spatial queries.
#[derive(Clone, Copy)]
pub struct EcsView<'a> {
    /// Entity registry.
    pub entities: &'a EntityRegistry,
    /// Position storage.
    pub positions: &'a ComponentStorage<Position>,
}

impl<'a> EcsView<'a> {
    /// Creates a view.
    #[must_use]
    pub const fn new(
        entities: &'a EntityRegistry,
        positions: &'a ComponentStorage<Position>,
    ) -> Self {
        Self {
            entities,
            positions,
        }
    }

    /// Position of `entity`, if it has one.
    #[inline]
    #[must_use]
    pub fn position_of(&self, entity: EntityHandle) -> Option<&'a Position> {
        position_of(self.entities, self.positions, entity)
    }

    /// Checks if `entity` is valid and has a `C` component.
    #[inline]
    #[must_use]
    pub fn has<C: Component>(&self, entity: EntityHandle) -> bool {
        self.entities
            .get_valid(entity)
            .is_some_and(|e| e.has::<C>())
    }
}

#[inline]
fn position_of<'a>(
    entities: &EntityRegistry,
    positions: &'a ComponentStorage<Position>,
    entity: EntityHandle,
) -> Option<&'a Position> {
    let handle = entities.component_handle::<Position>(entity)?;
    positions.get(handle)
}

/// Chunk and resident totals, for logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Number of chunks.
    pub chunks: usize,
    /// Entities resident across all chunks.
    pub residents: usize,
    /// Blocked tiles across all chunks.
    pub blocked_tiles: usize,
}

/// The tiled world.
#[derive(Clone, Debug)]
pub struct World {
    width: u32,
    height: u32,
    chunk_size: u32,
    chunks_wide: u32,
    chunks_high: u32,
    /// Row-major chunk grid.
    chunks: Vec<WorldChunk>,
}

impl World {
    /// Creates a world with the default chunk size.
    ///
    /// # Errors
    ///
    /// `InvalidDimensions` if either dimension is not a non-zero multiple
    /// of [`CHUNK_SIZE`].
    pub fn new(width: u32, height: u32) -> WorldResult<Self> {
        Self::with_chunk_size(width, height, CHUNK_SIZE)
    }

    /// Creates a world with an explicit chunk size.
    ///
    /// Paints grass everywhere plus one wall cross through the center
    /// (`x == width / 2` or `y == height / 2`), so runs are reproducible.
    ///
    /// # Errors
    ///
    /// `InvalidDimensions` if either dimension is not a non-zero multiple
    /// of `chunk_size`.
    pub fn with_chunk_size(width: u32, height: u32, chunk_size: u32) -> WorldResult<Self> {
        if chunk_size == 0
            || width == 0
            || height == 0
            || width % chunk_size != 0
            || height % chunk_size != 0
        {
            return Err(WorldError::InvalidDimensions {
                width,
                height,
                chunk_size,
            });
        }

        let chunks_wide = width / chunk_size;
        let chunks_high = height / chunk_size;
        let mut chunks = Vec::with_capacity(chunks_wide as usize * chunks_high as usize);
        for cy in 0..chunks_high {
            for cx in 0..chunks_wide {
                chunks.push(WorldChunk::new(
                    ChunkCoord::new(cx, cy),
                    chunk_size,
                    Terrain::GRASS,
                ));
            }
        }

        let mut world = Self {
            width,
            height,
            chunk_size,
            chunks_wide,
            chunks_high,
            chunks,
        };
        world.paint_wall_cross();
        Ok(world)
    }

    fn paint_wall_cross(&mut self) {
        let wall_x = self.width / 2;
        let wall_y = self.height / 2;
        for y in 0..self.height {
            self.paint(wall_x, y, Terrain::WALL);
        }
        for x in 0..self.width {
            self.paint(x, wall_y, Terrain::WALL);
        }
    }

    fn paint(&mut self, x: u32, y: u32, terrain: Terrain) {
        let (chunk, lx, ly) = self.split(x, y);
        *self.chunks[chunk].terrain_mut(lx, ly) = terrain;
    }

    /// Chunk index and chunk-local coordinates of an in-bounds tile.
    #[inline]
    fn split(&self, x: u32, y: u32) -> (usize, u32, u32) {
        let cx = x / self.chunk_size;
        let cy = y / self.chunk_size;
        let chunk = cy as usize * self.chunks_wide as usize + cx as usize;
        (chunk, x % self.chunk_size, y % self.chunk_size)
    }

    /// Bounds-checked [`split`](Self::split).
    #[inline]
    fn locate(&self, x: i32, y: i32) -> WorldResult<(usize, u32, u32)> {
        match (u32::try_from(x), u32::try_from(y)) {
            (Ok(ux), Ok(uy)) if ux < self.width && uy < self.height => Ok(self.split(ux, uy)),
            _ => Err(WorldError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            }),
        }
    }

    /// Width in tiles.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Chunk side length in tiles.
    #[inline]
    #[must_use]
    pub const fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Grid size in chunks, `(wide, high)`.
    #[inline]
    #[must_use]
    pub const fn chunk_counts(&self) -> (u32, u32) {
        (self.chunks_wide, self.chunks_high)
    }

    /// Checks if a tile lies inside the world.
    #[inline]
    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.locate(x, y).is_ok()
    }

    /// Terrain at a tile.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` outside the world.
    #[inline]
    pub fn at(&self, x: i32, y: i32) -> WorldResult<&Terrain> {
        let (chunk, lx, ly) = self.locate(x, y)?;
        Ok(self.chunks[chunk].terrain(lx, ly))
    }

    /// Mutable terrain at a tile.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` outside the world.
    #[inline]
    pub fn at_mut(&mut self, x: i32, y: i32) -> WorldResult<&mut Terrain> {
        let (chunk, lx, ly) = self.locate(x, y)?;
        Ok(self.chunks[chunk].terrain_mut(lx, ly))
    }

    /// Chunk containing a tile.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` outside the world.
    #[inline]
    pub fn chunk_at(&self, x: i32, y: i32) -> WorldResult<&WorldChunk> {
        let (chunk, _, _) = self.locate(x, y)?;
        Ok(&self.chunks[chunk])
    }

    /// Coordinate of the chunk containing a tile.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` outside the world.
    #[inline]
    pub fn chunk_coord(&self, x: i32, y: i32) -> WorldResult<ChunkCoord> {
        Ok(self.chunk_at(x, y)?.coord())
    }

    /// Chunk by chunk coordinate.
    #[inline]
    #[must_use]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&WorldChunk> {
        if coord.x >= self.chunks_wide || coord.y >= self.chunks_high {
            return None;
        }
        self.chunks
            .get(coord.y as usize * self.chunks_wide as usize + coord.x as usize)
    }

    /// Every chunk, row-major.
    #[inline]
    #[must_use]
    pub fn chunks(&self) -> &[WorldChunk] {
        &self.chunks
    }

    /// Checks if a tile is blocked.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` outside the world.
    #[inline]
    pub fn is_blocked(&self, x: i32, y: i32) -> WorldResult<bool> {
        let (chunk, lx, ly) = self.locate(x, y)?;
        Ok(self.chunks[chunk].is_blocked(lx, ly))
    }

    /// Sets or clears a tile's blocked bit.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` outside the world.
    #[inline]
    pub fn set_blocked(&mut self, x: i32, y: i32, blocked: bool) -> WorldResult<()> {
        let (chunk, lx, ly) = self.locate(x, y)?;
        self.chunks[chunk].set_blocked(lx, ly, blocked);
        Ok(())
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Places an entity at `position` and blocks its tile.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` if the position lies outside the world.
    pub fn add_entity(&mut self, entity: EntityHandle, position: &Position) -> WorldResult<()> {
        let (chunk, lx, ly) = self.locate(position.x, position.y)?;
        let chunk = &mut self.chunks[chunk];
        if chunk.is_blocked(lx, ly) {
            chunk.set_stacked(lx, ly, true);
        }
        chunk.set_blocked(lx, ly, true);
        chunk.push_entity(entity);
        Ok(())
    }

    /// Recomputes a tile's bits after `leaving` stepped off it.
    fn vacate(
        &mut self,
        chunk: usize,
        x: i32,
        y: i32,
        leaving: EntityHandle,
        entities: &EntityRegistry,
        positions: &ComponentStorage<Position>,
    ) {
        let (lx, ly) = (
            x.unsigned_abs() % self.chunk_size,
            y.unsigned_abs() % self.chunk_size,
        );
        let target = &mut self.chunks[chunk];
        if !target.is_stacked(lx, ly) {
            target.set_blocked(lx, ly, false);
            return;
        }

        let remaining = target
            .entities()
            .iter()
            .filter(|&&e| e != leaving)
            .filter_map(|&e| position_of(entities, positions, e))
            .filter(|p| p.same_tile(x, y))
            .count();
        target.set_blocked(lx, ly, remaining > 0);
        target.set_stacked(lx, ly, remaining > 1);
    }

    /// Unconditionally relocates an entity.
    ///
    /// Updates its Position, moves the blocked bit, and migrates it between
    /// chunk resident lists if it crossed a chunk boundary.
    ///
    /// # Errors
    ///
    /// `MissingPosition` if the entity has no Position, `OutOfBounds` if
    /// either tile lies outside the world. Nothing is mutated on error.
    pub fn move_entity(
        &mut self,
        entities: &EntityRegistry,
        positions: &mut ComponentStorage<Position>,
        entity: EntityHandle,
        x: i32,
        y: i32,
    ) -> WorldResult<()> {
        let handle = entities
            .component_handle::<Position>(entity)
            .ok_or(WorldError::MissingPosition(entity))?;
        let position = positions
            .get_mut(handle)
            .ok_or(WorldError::MissingPosition(entity))?;
        let (old_x, old_y) = (position.x, position.y);
        let (old_chunk, _, _) = self.locate(old_x, old_y)?;
        let (new_chunk, new_lx, new_ly) = self.locate(x, y)?;

        position.x = x;
        position.y = y;

        if old_chunk != new_chunk {
            self.chunks[old_chunk].remove_entity(entity);
            self.chunks[new_chunk].push_entity(entity);
        }

        self.vacate(old_chunk, old_x, old_y, entity, entities, positions);
        let target = &mut self.chunks[new_chunk];
        if target.is_blocked(new_lx, new_ly) {
            target.set_stacked(new_lx, new_ly, true);
        }
        target.set_blocked(new_lx, new_ly, true);
        Ok(())
    }

    /// Moves an entity unless the destination is a wall or blocked.
    ///
    /// Returns `Ok(false)` without mutating anything when the move is
    /// refused.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` for a destination outside the world,
    /// `MissingPosition` if the entity has no Position.
    pub fn try_move(
        &mut self,
        entities: &EntityRegistry,
        positions: &mut ComponentStorage<Position>,
        entity: EntityHandle,
        x: i32,
        y: i32,
    ) -> WorldResult<bool> {
        let (chunk, lx, ly) = self.locate(x, y)?;
        let destination = &self.chunks[chunk];
        if !destination.terrain(lx, ly).is_passable() || destination.is_blocked(lx, ly) {
            return Ok(false);
        }
        self.move_entity(entities, positions, entity, x, y)?;
        Ok(true)
    }

    /// Takes an entity out of the world, freeing its tile.
    ///
    /// Returns false if the entity has no position or was not resident.
    pub fn remove_entity(
        &mut self,
        entities: &EntityRegistry,
        positions: &ComponentStorage<Position>,
        entity: EntityHandle,
    ) -> bool {
        let Some(&position) = position_of(entities, positions, entity) else {
            return false;
        };
        let Ok((chunk, _, _)) = self.locate(position.x, position.y) else {
            return false;
        };
        if !self.chunks[chunk].remove_entity(entity) {
            return false;
        }
        self.vacate(chunk, position.x, position.y, entity, entities, positions);
        true
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Entities standing on a tile.
    ///
    /// Linear scan of the tile's chunk.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` outside the world.
    pub fn entities_at(
        &self,
        x: i32,
        y: i32,
        view: &EcsView<'_>,
    ) -> WorldResult<Vec<EntityHandle>> {
        let chunk = self.chunk_at(x, y)?;
        Ok(chunk
            .entities()
            .iter()
            .copied()
            .filter(|&e| view.position_of(e).is_some_and(|p| p.same_tile(x, y)))
            .collect())
    }

    /// Nearest valid plant in the same chunk as `src`.
    ///
    /// Neighbouring chunks are not searched. Returns `EntityHandle::NULL`
    /// if the chunk has no plant.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` if `src` lies outside the world.
    pub fn find_nearest_plant(
        &self,
        src: &Position,
        view: &EcsView<'_>,
    ) -> WorldResult<EntityHandle> {
        let chunk = self.chunk_at(src.x, src.y)?;
        let nearest = chunk
            .entities()
            .iter()
            .copied()
            .filter(|&e| view.has::<Plant>(e))
            .filter_map(|e| view.position_of(e).map(|p| (e, src.distance_squared(p))))
            .min_by_key(|&(_, d)| d);
        Ok(nearest.map_or(EntityHandle::NULL, |(e, _)| e))
    }

    // =========================================================================
    // Presentation
    // =========================================================================

    /// Positions of every resident of a chunk, for rendering.
    #[must_use]
    pub fn resident_positions(&self, coord: ChunkCoord, view: &EcsView<'_>) -> Vec<Position> {
        self.chunk(coord)
            .map(|chunk| {
                chunk
                    .entities()
                    .iter()
                    .filter_map(|&e| view.position_of(e).copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Chunk and resident totals, logged at info level.
    pub fn inspect(&self) -> WorldStats {
        let stats = WorldStats {
            chunks: self.chunks.len(),
            residents: self.chunks.iter().map(|c| c.entities().len()).sum(),
            blocked_tiles: self.chunks.iter().map(|c| c.blocked().blocked_count()).sum(),
        };
        tracing::info!(
            chunks = stats.chunks,
            residents = stats.residents,
            blocked = stats.blocked_tiles,
            "world inspected"
        );
        stats
    }
}

/// Reinterprets positions as raw bytes for upload to a renderer.
#[inline]
#[must_use]
pub fn positions_as_bytes(positions: &[Position]) -> &[u8] {
    bytemuck::cast_slice(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{ComponentId, EntityRegistry};
    use crate::world::TerrainKind;

    type Placed = (EntityRegistry, ComponentStorage<Position>, Vec<EntityHandle>);

    /// Registry + position storage with one entity per `(x, y)`.
    fn place(world: &mut World, tiles: &[(i32, i32)]) -> Placed {
        let mut entities = EntityRegistry::new();
        let mut positions = ComponentStorage::new();
        let mut handles = Vec::new();
        for &(x, y) in tiles {
            let e = entities.make_entity(None).unwrap();
            let h = positions.insert_value(e, Position::new(x, y, 0)).unwrap();
            entities
                .get_mut(e)
                .unwrap()
                .components
                .insert(ComponentId::Position, h);
            world.add_entity(e, positions.get(h).unwrap()).unwrap();
            handles.push(e);
        }
        (entities, positions, handles)
    }

    #[test]
    fn test_dimensions_must_be_multiples() {
        assert!(matches!(
            World::with_chunk_size(30, 25, 10),
            Err(WorldError::InvalidDimensions { .. })
        ));
        assert!(World::with_chunk_size(0, 10, 10).is_err());
        assert!(World::with_chunk_size(10, 10, 0).is_err());
        let world = World::with_chunk_size(30, 20, 10).unwrap();
        assert_eq!(world.chunk_counts(), (3, 2));
        assert_eq!(world.chunks().len(), 6);
    }

    #[test]
    fn test_wall_cross_painted() {
        let world = World::with_chunk_size(40, 40, 10).unwrap();
        for y in 0..40 {
            for x in 0..40 {
                let expected = if x == 20 || y == 20 {
                    TerrainKind::Wall
                } else {
                    TerrainKind::Grass
                };
                assert_eq!(world.at(x, y).unwrap().kind, expected, "tile ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let world = World::with_chunk_size(20, 20, 10).unwrap();
        assert!(matches!(world.at(-1, 0), Err(WorldError::OutOfBounds { .. })));
        assert!(matches!(world.at(0, 20), Err(WorldError::OutOfBounds { .. })));
        assert!(world.is_blocked(20, 0).is_err());
        assert!(world.in_bounds(19, 19));
        assert!(world.chunk(ChunkCoord::new(2, 0)).is_none());
    }

    #[test]
    fn test_stacked_tile_stays_blocked() {
        let mut world = World::with_chunk_size(30, 30, 10).unwrap();
        let (entities, mut positions, handles) = place(&mut world, &[(2, 2), (2, 2)]);
        assert!(world.try_move(&entities, &mut positions, handles[0], 3, 3).unwrap());
        assert!(world.is_blocked(2, 2).unwrap());
        assert!(world.try_move(&entities, &mut positions, handles[1], 4, 4).unwrap());
        assert!(!world.is_blocked(2, 2).unwrap());
    }

    #[test]
    fn test_move_onto_occupied_tile_stacks() {
        let mut world = World::with_chunk_size(30, 30, 10).unwrap();
        let (entities, mut positions, handles) = place(&mut world, &[(2, 2), (3, 3)]);
        world
            .move_entity(&entities, &mut positions, handles[0], 3, 3)
            .unwrap();
        assert!(world.chunk_at(3, 3).unwrap().is_stacked(3, 3));

        assert!(world.try_move(&entities, &mut positions, handles[1], 4, 4).unwrap());
        assert!(world.is_blocked(3, 3).unwrap());
        assert!(!world.chunk_at(3, 3).unwrap().is_stacked(3, 3));

        assert!(world.try_move(&entities, &mut positions, handles[0], 5, 5).unwrap());
        assert!(!world.is_blocked(3, 3).unwrap());
        assert!(!world.is_blocked(2, 2).unwrap());
    }

    #[test]
    fn test_move_in_place_keeps_tile_blocked() {
        let mut world = World::with_chunk_size(30, 30, 10).unwrap();
        let (entities, mut positions, handles) = place(&mut world, &[(6, 6)]);
        world
            .move_entity(&entities, &mut positions, handles[0], 6, 6)
            .unwrap();
        assert!(world.is_blocked(6, 6).unwrap());
        assert!(!world.chunk_at(6, 6).unwrap().is_stacked(6, 6));
    }

    #[test]
    fn test_remove_entity_frees_tile() {
        let mut world = World::with_chunk_size(30, 30, 10).unwrap();
        let (entities, positions, handles) = place(&mut world, &[(5, 5)]);
        assert!(world.remove_entity(&entities, &positions, handles[0]));
        assert!(!world.is_blocked(5, 5).unwrap());
        assert!(world.chunk_at(5, 5).unwrap().entities().is_empty());
        assert!(!world.remove_entity(&entities, &positions, handles[0]));
    }

    #[test]
    fn test_entities_at() {
        let mut world = World::with_chunk_size(30, 30, 10).unwrap();
        let (entities, positions, handles) = place(&mut world, &[(1, 1), (1, 2), (1, 1)]);
        let view = EcsView::new(&entities, &positions);
        let mut at = world.entities_at(1, 1, &view).unwrap();
        at.sort_by_key(|e| e.index());
        assert_eq!(at, vec![handles[0], handles[2]]);
        assert!(world.entities_at(9, 9, &view).unwrap().is_empty());
    }

    #[test]
    fn test_positions_as_bytes() {
        let positions = [Position::new(1, 2, 3), Position::new(4, 5, 6)];
        let bytes = positions_as_bytes(&positions);
        assert_eq!(bytes.len(), 2 * std::mem::size_of::<Position>());
    }
}
