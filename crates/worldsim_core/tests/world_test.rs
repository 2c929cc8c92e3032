//! Integration tests for the chunked world: terrain, movement, occupancy.

use std::collections::HashSet;

use worldsim_core::world::ChunkCoord;
use worldsim_core::{
    Ecs, EcsView, EntityHandle, Plant, PopulationConfig, Position, TerrainKind, World, WorldError,
};

/// Spawns an entity with a Position and places it in the world.
fn place(ecs: &Ecs, world: &mut World, x: i32, y: i32) -> EntityHandle {
    let e = ecs.spawn().unwrap();
    let position = Position::new(x, y, 0);
    ecs.add_component_with(e, position).unwrap();
    world.add_entity(e, &position).unwrap();
    e
}

fn try_move(ecs: &Ecs, world: &mut World, e: EntityHandle, x: i32, y: i32) -> bool {
    let entities = ecs.entities().read();
    let mut positions = ecs.storage::<Position>().write();
    world.try_move(&entities, &mut positions, e, x, y).unwrap()
}

fn position(ecs: &Ecs, e: EntityHandle) -> (i32, i32) {
    let p = ecs.component::<Position>(e).unwrap();
    (p.x, p.y)
}

/// Every resident lies in its chunk, and blocked tiles are exactly the
/// tiles some resident stands on.
fn assert_occupancy_consistent(ecs: &Ecs, world: &World) {
    let entities = ecs.entities().read();
    let positions = ecs.storage::<Position>().read();
    let view = EcsView::new(&entities, &positions);
    let size = i32::try_from(world.chunk_size()).unwrap();

    for chunk in world.chunks() {
        let ChunkCoord { x: cx, y: cy } = chunk.coord();
        let (ox, oy) = (i32::try_from(cx).unwrap() * size, i32::try_from(cy).unwrap() * size);

        let mut occupied = HashSet::new();
        for &e in chunk.entities() {
            let p = view.position_of(e).expect("resident has a position");
            assert!(
                (ox..ox + size).contains(&p.x) && (oy..oy + size).contains(&p.y),
                "{e} at ({}, {}) outside chunk ({cx}, {cy})",
                p.x,
                p.y
            );
            occupied.insert((p.x, p.y));
        }

        let blocked: HashSet<_> = chunk
            .blocked()
            .iter_blocked()
            .map(|(lx, ly)| (ox + i32::try_from(lx).unwrap(), oy + i32::try_from(ly).unwrap()))
            .collect();
        assert_eq!(blocked, occupied, "chunk ({cx}, {cy})");
    }
}

#[test]
fn test_terrain_reads_back_painted_values() {
    let mut world = World::with_chunk_size(30, 30, 10).unwrap();
    *world.at_mut(3, 4).unwrap() = worldsim_core::Terrain::WATER;

    for y in 0..30 {
        for x in 0..30 {
            let expected = if (x, y) == (3, 4) {
                TerrainKind::Water
            } else if x == 15 || y == 15 {
                TerrainKind::Wall
            } else {
                TerrainKind::Grass
            };
            assert_eq!(world.at(x, y).unwrap().kind, expected);
        }
    }
}

#[test]
fn test_world_rejects_uneven_dimensions() {
    assert_eq!(
        World::with_chunk_size(25, 30, 10).unwrap_err(),
        WorldError::InvalidDimensions {
            width: 25,
            height: 30,
            chunk_size: 10,
        }
    );
    assert!(World::new(500, 500).is_ok());
    assert!(World::new(500, 510).is_err());
}

#[test]
fn test_move_into_wall_fails_without_mutation() {
    let ecs = Ecs::new();
    let mut world = World::with_chunk_size(30, 30, 10).unwrap();
    let e = place(&ecs, &mut world, 14, 14);

    assert!(!try_move(&ecs, &mut world, e, 15, 14));
    assert_eq!(position(&ecs, e), (14, 14));
    assert!(world.is_blocked(14, 14).unwrap());
    assert!(!world.is_blocked(15, 14).unwrap());
    assert_occupancy_consistent(&ecs, &world);
}

#[test]
fn test_move_into_blocked_tile_fails() {
    let ecs = Ecs::new();
    let mut world = World::with_chunk_size(30, 30, 10).unwrap();
    let mover = place(&ecs, &mut world, 2, 2);
    let _blocker = place(&ecs, &mut world, 3, 3);

    assert!(!try_move(&ecs, &mut world, mover, 3, 3));
    assert_eq!(position(&ecs, mover), (2, 2));
    assert_occupancy_consistent(&ecs, &world);
}

#[test]
fn test_move_onto_free_grass_updates_occupancy() {
    let ecs = Ecs::new();
    let mut world = World::with_chunk_size(30, 30, 10).unwrap();
    let e = place(&ecs, &mut world, 2, 2);

    assert!(try_move(&ecs, &mut world, e, 3, 3));
    assert_eq!(position(&ecs, e), (3, 3));
    assert!(!world.is_blocked(2, 2).unwrap());
    assert!(world.is_blocked(3, 3).unwrap());
    assert_eq!(world.chunk_at(3, 3).unwrap().entities(), &[e]);
    assert_occupancy_consistent(&ecs, &world);
}

#[test]
fn test_move_across_chunk_boundary_migrates_once() {
    let ecs = Ecs::new();
    let mut world = World::with_chunk_size(30, 30, 10).unwrap();
    let e = place(&ecs, &mut world, 9, 9);

    assert!(try_move(&ecs, &mut world, e, 10, 10));

    let old = world.chunk(ChunkCoord::new(0, 0)).unwrap();
    let new = world.chunk(ChunkCoord::new(1, 1)).unwrap();
    assert!(old.entities().is_empty());
    assert_eq!(new.entities(), &[e]);
    assert!(!world.is_blocked(9, 9).unwrap());
    assert!(world.is_blocked(10, 10).unwrap());
    assert_eq!(world.chunk_coord(10, 10).unwrap(), ChunkCoord::new(1, 1));
    assert_occupancy_consistent(&ecs, &world);
}

#[test]
fn test_forced_moves_onto_shared_tile_keep_occupancy_exact() {
    let ecs = Ecs::new();
    let mut world = World::with_chunk_size(30, 30, 10).unwrap();
    let a = place(&ecs, &mut world, 2, 2);
    let b = place(&ecs, &mut world, 3, 3);
    let c = place(&ecs, &mut world, 11, 11);

    let force = |world: &mut World, e: EntityHandle, x: i32, y: i32| {
        let entities = ecs.entities().read();
        let mut positions = ecs.storage::<Position>().write();
        world.move_entity(&entities, &mut positions, e, x, y).unwrap();
    };

    // Stack three residents on (3, 3), one arriving from another chunk.
    force(&mut world, a, 3, 3);
    assert_occupancy_consistent(&ecs, &world);
    force(&mut world, c, 3, 3);
    assert_occupancy_consistent(&ecs, &world);
    assert!(world.chunk(ChunkCoord::new(1, 1)).unwrap().entities().is_empty());

    // Move each off in turn; the tile stays blocked until the last leaves.
    for (e, to) in [(b, (4, 4)), (a, (5, 5))] {
        assert!(try_move(&ecs, &mut world, e, to.0, to.1));
        assert!(world.is_blocked(3, 3).unwrap());
        assert_occupancy_consistent(&ecs, &world);
    }
    force(&mut world, c, 12, 12);
    assert!(!world.is_blocked(3, 3).unwrap());
    assert_occupancy_consistent(&ecs, &world);
}

#[test]
fn test_move_out_of_bounds_is_an_error() {
    let ecs = Ecs::new();
    let mut world = World::with_chunk_size(30, 30, 10).unwrap();
    let e = place(&ecs, &mut world, 29, 0);

    let entities = ecs.entities().read();
    let mut positions = ecs.storage::<Position>().write();
    assert!(matches!(
        world.try_move(&entities, &mut positions, e, 30, 0),
        Err(WorldError::OutOfBounds { x: 30, y: 0, .. })
    ));
}

#[test]
fn test_nearest_plant_is_chunk_local() {
    let ecs = Ecs::new();
    let mut world = World::with_chunk_size(40, 40, 10).unwrap();
    let near_other_chunk = place(&ecs, &mut world, 10, 5);
    ecs.add_component::<Plant>(near_other_chunk).unwrap();
    let far_same_chunk = place(&ecs, &mut world, 0, 0);
    ecs.add_component::<Plant>(far_same_chunk).unwrap();

    let entities = ecs.entities().read();
    let positions = ecs.storage::<Position>().read();
    let view = EcsView::new(&entities, &positions);
    let found = world
        .find_nearest_plant(&Position::new(9, 5, 0), &view)
        .unwrap();
    assert_eq!(found, far_same_chunk);

    let none = world
        .find_nearest_plant(&Position::new(25, 25, 0), &view)
        .unwrap();
    assert!(none.is_null());
}

#[test]
fn test_populated_world_is_consistent() {
    let ecs = Ecs::new();
    let mut world = World::with_chunk_size(200, 200, 50).unwrap();
    let report = world
        .populate(
            &ecs,
            &PopulationConfig {
                seed: 12345,
                actors: 500,
                plants: 5_000,
                max_attempts: 10_000,
            },
        )
        .unwrap();

    assert_eq!((report.actors, report.plants), (500, 5_000));
    assert_occupancy_consistent(&ecs, &world);

    let stats = world.inspect();
    assert_eq!(stats.chunks, 16);
    assert_eq!(stats.residents, 5_500);
}
