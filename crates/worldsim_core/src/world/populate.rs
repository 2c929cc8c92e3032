//! # Population
//!
//! Seeds a fresh world with actors and plants.
//!
//! Placement is driven by a seeded `ChaCha8Rng`, so the same seed and
//! config always produce the same layout.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::grid::World;
use super::terrain::TerrainKind;
use crate::config::PopulationConfig;
use crate::ecs::{
    Actor, Component, ComponentId, Creature, Ecs, EntityHandle, Inventory, Movable, Plant,
    Position, PrefabId,
};
use crate::error::{WorldError, WorldResult};

/// Prefab name for actors.
pub const ACTOR_PREFAB: &str = "actor";
/// Prefab name for plants.
pub const PLANT_PREFAB: &str = "plant";

/// What [`World::populate`] placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PopulationReport {
    /// Actors placed.
    pub actors: usize,
    /// Plants placed.
    pub plants: usize,
    /// Candidate tiles rejected along the way.
    pub rejected: u64,
}

/// Which tiles a placement may land on.
#[derive(Clone, Copy)]
enum Placement {
    /// Grass that nobody stands on.
    FreeGrass,
    /// Any grass.
    Grass,
}

/// Registers `name` if it is new. Returns its id and whether it was new.
fn ensure_prefab(ecs: &Ecs, name: &str) -> WorldResult<(PrefabId, bool)> {
    if let Some(id) = ecs.entities().read().prefab_id(name) {
        return Ok((id, false));
    }
    Ok((ecs.make_prefab(name)?, true))
}

/// Registers the actor and plant prefabs.
fn register_prefabs(ecs: &Ecs) -> WorldResult<()> {
    let (actor, fresh) = ensure_prefab(ecs, ACTOR_PREFAB)?;
    if fresh {
        ecs.add_prefab_component(actor, Position::default())?;
        ecs.add_prefab_component(actor, Movable::default())?;
        ecs.add_prefab_component(actor, Creature::default())?;
        ecs.add_prefab_component(actor, Inventory::default())?;
        ecs.add_prefab_component(actor, Actor::default())?;
    }

    let (plant, fresh) = ensure_prefab(ecs, PLANT_PREFAB)?;
    if fresh {
        ecs.add_prefab_component(plant, Position::default())?;
        ecs.add_prefab_component(plant, Plant::default())?;
    }
    Ok(())
}

impl World {
    /// Places `config.actors` actors then `config.plants` plants.
    ///
    /// Actors need a free grass tile. Plants only need grass, so they may
    /// share a tile with an actor or another plant.
    ///
    /// # Errors
    ///
    /// `PlacementExhausted` if any single entity finds no valid tile within
    /// `config.max_attempts` draws. Registry errors are forwarded.
    pub fn populate(
        &mut self,
        ecs: &Ecs,
        config: &PopulationConfig,
    ) -> WorldResult<PopulationReport> {
        register_prefabs(ecs)?;
        ecs.reserve(
            config.actors + config.plants,
            &[ComponentId::Position, ComponentId::Plant],
        );
        ecs.reserve(
            config.actors,
            &[
                ComponentId::Movable,
                ComponentId::Creature,
                ComponentId::Inventory,
                ComponentId::Actor,
            ],
        );

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut report = PopulationReport::default();

        for _ in 0..config.actors {
            let tile = self.find_tile(
                &mut rng,
                Placement::FreeGrass,
                ACTOR_PREFAB,
                config,
                &mut report,
            )?;
            self.spawn_at(ecs, ACTOR_PREFAB, tile)?;
            report.actors += 1;
        }
        for _ in 0..config.plants {
            let tile =
                self.find_tile(&mut rng, Placement::Grass, PLANT_PREFAB, config, &mut report)?;
            self.spawn_at(ecs, PLANT_PREFAB, tile)?;
            report.plants += 1;
        }

        tracing::info!(
            seed = config.seed,
            actors = report.actors,
            plants = report.plants,
            rejected = report.rejected,
            "world populated"
        );
        Ok(report)
    }

    fn find_tile(
        &self,
        rng: &mut ChaCha8Rng,
        placement: Placement,
        kind: &'static str,
        config: &PopulationConfig,
        report: &mut PopulationReport,
    ) -> WorldResult<(i32, i32)> {
        let width = i32::try_from(self.width()).unwrap_or(i32::MAX);
        let height = i32::try_from(self.height()).unwrap_or(i32::MAX);

        for _ in 0..config.max_attempts {
            let x = rng.gen_range(0..width);
            let y = rng.gen_range(0..height);
            let grass = self.at(x, y)?.kind == TerrainKind::Grass;
            let accepted = match placement {
                Placement::Grass => grass,
                Placement::FreeGrass => grass && !self.is_blocked(x, y)?,
            };
            if accepted {
                return Ok((x, y));
            }
            report.rejected += 1;
        }

        tracing::warn!(kind, attempts = config.max_attempts, "placement exhausted");
        Err(WorldError::PlacementExhausted {
            kind,
            attempts: config.max_attempts,
        })
    }

    fn spawn_at(
        &mut self,
        ecs: &Ecs,
        prefab: &str,
        (x, y): (i32, i32),
    ) -> WorldResult<EntityHandle> {
        let entity = ecs.spawn_from_prefab(prefab)?;
        let position = ecs
            .with_component_mut::<Position, _>(entity, |p| {
                p.x = x;
                p.y = y;
                *p
            })
            .ok_or(WorldError::MissingPosition(entity))?;
        debug_assert_eq!(position.parent(), entity);
        self.add_entity(entity, &position)?;
        Ok(entity)
    }
}
