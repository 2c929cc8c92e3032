use super::System;
use crate::ecs::Plant;
use crate::error::ScheduleResult;
use crate::schedule::{Access, TickContext};

/// Grows fruit on every plant.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlantSystem;

impl System for PlantSystem {
    fn name(&self) -> &'static str {
        "plant"
    }

    fn access(&self) -> Access {
        Access::new().write::<Plant>()
    }

    fn process(&self, ctx: &TickContext<'_>) -> ScheduleResult<()> {
        let mut plants = ctx.write::<Plant>()?;
        let mut ripened = 0u32;
        for (_, plant) in plants.iter_mut() {
            if plant.grow() {
                ripened += 1;
            }
        }
        tracing::trace!(tick = ctx.tick(), ripened, "plant pass");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SimState;
    use crate::world::World;

    #[test]
    fn test_plant_pass_grows_every_plant() {
        let state = SimState::new(World::with_chunk_size(10, 10, 10).unwrap());
        let a = state.ecs.spawn().unwrap();
        let b = state.ecs.spawn().unwrap();
        state.ecs.add_component::<Plant>(a).unwrap();
        state
            .ecs
            .add_component_with(
                b,
                Plant {
                    growth_time: 2,
                    ..Plant::default()
                },
            )
            .unwrap();

        let system = PlantSystem;
        let access = system.access();
        for tick in 0..2 {
            system
                .process(&TickContext::new(&state, &access, system.name(), tick))
                .unwrap();
        }

        assert_eq!(state.ecs.component::<Plant>(a).unwrap().growth_status, 2);
        let b = state.ecs.component::<Plant>(b).unwrap();
        assert_eq!((b.fruit, b.growth_status), (1, 0));
    }
}
