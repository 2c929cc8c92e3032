//! # Tick Benchmark
//!
//! Populates a world once, then measures full scheduler ticks.
//!
//! Run with: `cargo bench --package worldsim_core`

#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use worldsim_core::{
    Game, PopulationConfig, SchedulerConfig, SimState, World, WorldConfig,
};

fn populated(world: WorldConfig, population: PopulationConfig) -> Arc<SimState> {
    let state = SimState::from_config(&world).expect("valid world");
    state.populate(&population).expect("population fits");
    Arc::new(state)
}

/// Benchmark: population alone.
fn bench_populate(c: &mut Criterion) {
    let population = PopulationConfig {
        actors: 5_000,
        plants: 50_000,
        ..PopulationConfig::default()
    };
    c.bench_function("populate_1000x1000", |b| {
        b.iter(|| {
            let state = SimState::new(World::new(1_000, 1_000).expect("valid world"));
            black_box(state.populate(&population).expect("population fits"))
        });
    });
}

/// Benchmark: one tick of all four systems at several population sizes.
fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    group.sample_size(20);

    for actors in [1_000usize, 10_000, 50_000] {
        let world = WorldConfig {
            width: 5_000,
            height: 5_000,
            chunk_size: 250,
        };
        let population = PopulationConfig {
            actors,
            plants: actors * 10,
            ..PopulationConfig::default()
        };
        let scheduler = SchedulerConfig {
            // Creatures starve after 250 ticks; keep them in the world.
            reap_dead: false,
            ..SchedulerConfig::default()
        };
        let mut game = Game::with_default_systems(populated(world, population), scheduler)
            .expect("scheduler starts");

        // Entities processed per tick: actors plus plants.
        group.throughput(Throughput::Elements((actors * 11) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(actors), &actors, |b, _| {
            b.iter(|| game.tick().expect("tick completes"));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_populate, bench_tick);
criterion_main!(benches);
