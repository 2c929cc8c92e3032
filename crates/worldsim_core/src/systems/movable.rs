use super::System;
use crate::ecs::{Movable, Position};
use crate::error::ScheduleResult;
use crate::schedule::{Access, Resource, TickContext};

/// Steps every movable entity one tile diagonally toward the far corner.
///
/// Moves go through `World::try_move`, so walls and occupied tiles stop
/// an entity in place. Dead entities are skipped.
#[derive(Clone, Copy, Debug, Default)]
pub struct MovableSystem;

impl System for MovableSystem {
    fn name(&self) -> &'static str {
        "movable"
    }

    fn access(&self) -> Access {
        Access::new()
            .writes(Resource::World)
            .reads(Resource::Entities)
            .write::<Position>()
            .read::<Movable>()
    }

    fn process(&self, ctx: &TickContext<'_>) -> ScheduleResult<()> {
        let mut world = ctx.write_world()?;
        let entities = ctx.read_entities()?;
        let mut positions = ctx.write::<Position>()?;
        let movables = ctx.read::<Movable>()?;

        let max_x = i32::try_from(world.width()).unwrap_or(i32::MAX) - 1;
        let max_y = i32::try_from(world.height()).unwrap_or(i32::MAX) - 1;
        let mut moved = 0u32;

        for (_, movable) in movables.iter() {
            let owner = movable.parent;
            let Some(handle) = entities
                .get_valid(owner)
                .and_then(|e| e.handle_of::<Position>())
            else {
                continue;
            };
            let Some(&Position { x, y, .. }) = positions.get(handle) else {
                continue;
            };
            if x < max_x
                && y < max_y
                && world.try_move(&entities, &mut positions, owner, x + 1, y + 1)?
            {
                moved += 1;
            }
        }

        tracing::trace!(tick = ctx.tick(), moved, "movable pass");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::EntityHandle;
    use crate::state::SimState;
    use crate::world::World;

    fn mover(state: &SimState, x: i32, y: i32) -> EntityHandle {
        let e = state.ecs.spawn().unwrap();
        let position = Position::new(x, y, 0);
        state.ecs.add_component_with(e, position).unwrap();
        state.ecs.add_component::<Movable>(e).unwrap();
        state.world.write().add_entity(e, &position).unwrap();
        e
    }

    fn run(state: &SimState, tick: u64) {
        let system = MovableSystem;
        let access = system.access();
        system
            .process(&TickContext::new(state, &access, system.name(), tick))
            .unwrap();
    }

    fn position(state: &SimState, e: EntityHandle) -> (i32, i32) {
        let p = state.ecs.component::<Position>(e).unwrap();
        (p.x, p.y)
    }

    #[test]
    fn test_steps_diagonally() {
        let state = SimState::new(World::with_chunk_size(40, 40, 10).unwrap());
        let e = mover(&state, 1, 1);
        run(&state, 0);
        assert_eq!(position(&state, e), (2, 2));
        assert!(state.world.read().is_blocked(2, 2).unwrap());
        assert!(!state.world.read().is_blocked(1, 1).unwrap());
    }

    #[test]
    fn test_stops_at_edge_and_wall() {
        let state = SimState::new(World::with_chunk_size(40, 40, 10).unwrap());
        let edge = mover(&state, 39, 5);
        // Wall cross at x == 20.
        let walled = mover(&state, 19, 3);
        run(&state, 0);
        assert_eq!(position(&state, edge), (39, 5));
        assert_eq!(position(&state, walled), (19, 3));
    }

    #[test]
    fn test_dead_entities_stay_put() {
        let state = SimState::new(World::with_chunk_size(40, 40, 10).unwrap());
        let e = mover(&state, 1, 1);
        state.ecs.kill(e);
        run(&state, 0);
        assert_eq!(position(&state, e), (1, 1));
    }
}
