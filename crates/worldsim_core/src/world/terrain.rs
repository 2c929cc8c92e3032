//! # Terrain
//!
//! Per-tile terrain type and movement cost.

/// Terrain type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TerrainKind {
    /// Unpainted.
    #[default]
    None,
    /// Walkable, the only tile population places entities on.
    Grass,
    /// Impassable.
    Wall,
    /// Not placeable.
    Water,
}

/// One tile of terrain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Terrain {
    /// Terrain type.
    pub kind: TerrainKind,
    /// Relative cost of crossing this tile.
    pub movement_cost: u16,
}

impl Terrain {
    /// Grass tile.
    pub const GRASS: Self = Self::of(TerrainKind::Grass);
    /// Wall tile.
    pub const WALL: Self = Self::of(TerrainKind::Wall);
    /// Water tile.
    pub const WATER: Self = Self::of(TerrainKind::Water);

    /// Tile of `kind` with its default movement cost.
    #[must_use]
    pub const fn of(kind: TerrainKind) -> Self {
        let movement_cost = match kind {
            TerrainKind::None => 0,
            TerrainKind::Grass => 1,
            TerrainKind::Water => 4,
            TerrainKind::Wall => u16::MAX,
        };
        Self {
            kind,
            movement_cost,
        }
    }

    /// Checks if entities can enter this tile.
    #[inline]
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !matches!(self.kind, TerrainKind::Wall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_sizes() {
        assert_eq!(std::mem::size_of::<TerrainKind>(), 1);
        assert!(std::mem::size_of::<Terrain>() <= 4);
    }

    #[test]
    fn test_passability() {
        assert!(Terrain::GRASS.is_passable());
        assert!(Terrain::WATER.is_passable());
        assert!(!Terrain::WALL.is_passable());
    }
}
