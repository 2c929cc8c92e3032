use super::System;
use crate::ecs::Creature;
use crate::error::ScheduleResult;
use crate::schedule::{Access, Resource, TickContext};

/// Advances hunger and kills creatures that starve.
///
/// A starved creature is killed at the end of the phase, so other systems
/// in the same phase still see it alive. The scheduler reaps it after the
/// tick barrier.
#[derive(Clone, Copy, Debug, Default)]
pub struct CreatureSystem;

impl System for CreatureSystem {
    fn name(&self) -> &'static str {
        "creature"
    }

    fn access(&self) -> Access {
        Access::new().reads(Resource::Entities).write::<Creature>()
    }

    fn process(&self, ctx: &TickContext<'_>) -> ScheduleResult<()> {
        let entities = ctx.read_entities()?;
        let mut creatures = ctx.write::<Creature>()?;

        for (_, creature) in creatures.iter_mut() {
            creature.hunger = creature.hunger.saturating_add(1);
            if !creature.is_starved() || entities.get_valid(creature.parent).is_none() {
                continue;
            }
            ctx.kill(creature.parent);
            tracing::debug!(
                tick = ctx.tick(),
                entity = %creature.parent,
                hunger = creature.hunger,
                "creature starved"
            );
        }
        Ok(())
    }
}
