//! # Tick Scheduler
//!
//! A fixed pool of worker threads fed one job per system per tick.
//!
//! ```text
//! Game::tick, for each phase in order:
//!   ├── send Job{system, tick} ──► worker 0 ─┐
//!   ├── send Job{system, tick} ──► worker 1 ─┤ process()
//!   ├── ...                                  │
//!   └── recv_timeout ◄──── Completion ───────┘
//!        (once per system in the phase, bounded)
//!   then: apply deferred deaths
//! after the last phase: reap dead, tick += 1
//! ```
//!
//! Systems in one phase run concurrently and may not conflict: none of
//! them writes a resource another reads or writes. Phases run in
//! registration order, so a tick has the same outcome however the workers
//! interleave. If a system fails to report within the stall timeout the
//! game is faulted and refuses further ticks.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use super::access::Access;
use super::context::TickContext;
use super::stats::TickStats;
use crate::config::SchedulerConfig;
use crate::error::{ScheduleError, ScheduleResult};
use crate::state::SimState;
use crate::systems::{ActorSystem, CreatureSystem, MovableSystem, PlantSystem, System};

/// Lifecycle of one registered system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SystemState {
    /// Waiting for the next tick.
    Idle = 0,
    /// A job for this tick is queued.
    TickRequested = 1,
    /// A worker is running the system.
    Processing = 2,
    /// The game shut down.
    Terminated = 3,
}

impl SystemState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::TickRequested,
            2 => Self::Processing,
            _ => Self::Terminated,
        }
    }
}

/// A system plus its declared access and live state.
struct SystemSlot {
    system: Box<dyn System>,
    access: Access,
    state: AtomicU8,
}

impl SystemSlot {
    fn set_state(&self, state: SystemState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn state(&self) -> SystemState {
        SystemState::from_u8(self.state.load(Ordering::Acquire))
    }
}

/// Everything workers share with the game.
struct Shared {
    state: Arc<SimState>,
    systems: Vec<SystemSlot>,
    shutdown: AtomicBool,
}

/// One system pass to run.
#[derive(Clone, Copy, Debug)]
struct Job {
    system: usize,
    tick: u64,
}

/// Result of one system pass.
struct Completion {
    system: usize,
    tick: u64,
    result: ScheduleResult<()>,
}

/// Wires systems to shared state.
pub struct GameBuilder {
    state: Arc<SimState>,
    config: SchedulerConfig,
    /// Systems grouped by phase, in run order. Never empty.
    phases: Vec<Vec<Box<dyn System>>>,
}

impl GameBuilder {
    /// Starts a builder with default scheduler settings and no systems.
    #[must_use]
    pub fn new(state: Arc<SimState>) -> Self {
        Self {
            state,
            config: SchedulerConfig::default(),
            phases: vec![Vec::new()],
        }
    }

    /// Replaces the scheduler settings.
    #[must_use]
    pub const fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a system in the current phase.
    #[must_use]
    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        if let Some(phase) = self.phases.last_mut() {
            phase.push(Box::new(system));
        }
        self
    }

    /// Starts a new phase. Systems registered after this run once every
    /// earlier system of the tick has finished.
    #[must_use]
    pub fn next_phase(mut self) -> Self {
        if self.phases.last().is_some_and(|phase| !phase.is_empty()) {
            self.phases.push(Vec::new());
        }
        self
    }

    /// Registers the standard systems in two phases: actor, plant and
    /// creature first, then movable.
    ///
    /// Actors pick targets from positions before anyone moves, and
    /// creatures that starve are dead before the movable pass.
    ///
    /// # Errors
    ///
    /// `ThreadPool` if the actor pool cannot be built.
    pub fn with_default_systems(self) -> ScheduleResult<Self> {
        let actors = ActorSystem::with_threads(self.config.inner_workers)?;
        Ok(self
            .with_system(actors)
            .with_system(PlantSystem)
            .with_system(CreatureSystem)
            .next_phase()
            .with_system(MovableSystem))
    }

    /// Validates access declarations and starts the workers.
    ///
    /// # Errors
    ///
    /// `AccessConflict` if two systems in one phase conflict,
    /// `WorkerSpawn` if a worker thread cannot be started.
    pub fn build(self) -> ScheduleResult<Game> {
        let mut systems: Vec<SystemSlot> = Vec::new();
        let mut phases: Vec<Range<usize>> = Vec::new();
        for phase in self.phases.into_iter().filter(|phase| !phase.is_empty()) {
            let start = systems.len();
            systems.extend(phase.into_iter().map(|system| SystemSlot {
                access: system.access(),
                system,
                state: AtomicU8::new(SystemState::Idle as u8),
            }));
            phases.push(start..systems.len());
        }

        for phase in &phases {
            let members = &systems[phase.clone()];
            for (i, first) in members.iter().enumerate() {
                for second in &members[i + 1..] {
                    if let Some(resource) = first.access.conflict(&second.access) {
                        return Err(ScheduleError::AccessConflict {
                            first: first.system.name(),
                            second: second.system.name(),
                            resource,
                        });
                    }
                }
            }
        }

        let shared = Arc::new(Shared {
            state: self.state,
            systems,
            shutdown: AtomicBool::new(false),
        });
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<Completion>();

        let worker_count = self.config.workers.max(1);
        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let worker_shared = Arc::clone(&shared);
            let jobs = job_rx.clone();
            let done = done_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("worldsim-worker-{id}"))
                .spawn(move || worker_loop(&worker_shared, &jobs, &done));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    shared.shutdown.store(true, Ordering::Release);
                    drop(job_tx);
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(ScheduleError::WorkerSpawn(e));
                }
            }
        }

        tracing::info!(
            workers = worker_count,
            systems = shared.systems.len(),
            phases = phases.len(),
            "scheduler started"
        );

        Ok(Game {
            shared,
            phases,
            jobs: Some(job_tx),
            done: done_rx,
            workers,
            config: self.config,
            tick: 0,
            faulted: false,
            stats: TickStats::new(),
        })
    }
}

fn worker_loop(shared: &Shared, jobs: &Receiver<Job>, done: &Sender<Completion>) {
    while let Ok(job) = jobs.recv() {
        if shared.shutdown.load(Ordering::Acquire) {
            break;
        }
        let Some(slot) = shared.systems.get(job.system) else {
            continue;
        };
        slot.set_state(SystemState::Processing);

        let name = slot.system.name();
        let ctx = TickContext::new(&shared.state, &slot.access, name, job.tick);
        let result = slot
            .system
            .process(&ctx)
            .map_err(|source| ScheduleError::System {
                system: name,
                source: Box::new(source),
            });

        slot.set_state(SystemState::Idle);
        let completion = Completion {
            system: job.system,
            tick: job.tick,
            result,
        };
        if done.send(completion).is_err() {
            break;
        }
    }
}

/// The running simulation.
pub struct Game {
    shared: Arc<Shared>,
    /// Contiguous ranges of `shared.systems`, in run order.
    phases: Vec<Range<usize>>,
    jobs: Option<Sender<Job>>,
    done: Receiver<Completion>,
    workers: Vec<JoinHandle<()>>,
    config: SchedulerConfig,
    tick: u64,
    faulted: bool,
    stats: TickStats,
}

impl Game {
    /// Starts a game running the four standard systems.
    ///
    /// # Errors
    ///
    /// As [`GameBuilder::with_default_systems`] and [`GameBuilder::build`].
    pub fn with_default_systems(
        state: Arc<SimState>,
        config: SchedulerConfig,
    ) -> ScheduleResult<Self> {
        GameBuilder::new(state)
            .with_config(config)
            .with_default_systems()?
            .build()
    }

    /// Runs one tick: every phase in order, then post-barrier maintenance.
    ///
    /// Deaths requested during a phase are applied once it completes,
    /// even if one of its systems failed.
    ///
    /// # Errors
    ///
    /// - `Faulted` after an earlier stall
    /// - `Terminated` after shutdown
    /// - `Stalled` if a system does not report in time; faults the game
    /// - `System` if a system pass failed; later phases are skipped and
    ///   the tick does not advance
    pub fn tick(&mut self) -> ScheduleResult<()> {
        if self.faulted {
            return Err(ScheduleError::Faulted);
        }
        if self.jobs.is_none() {
            return Err(ScheduleError::Terminated);
        }

        let started = Instant::now();
        let tick = self.tick;
        let mut killed = 0;

        for phase in 0..self.phases.len() {
            match self.run_phase(tick, self.phases[phase].clone()) {
                Ok(()) => killed += self.shared.state.apply_deaths(),
                Err(e @ ScheduleError::System { .. }) => {
                    self.shared.state.apply_deaths();
                    tracing::warn!(tick, phase, error = %e, "system pass failed");
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        }

        let reaped = if self.config.reap_dead {
            self.shared.state.reap_dead().len()
        } else {
            0
        };
        self.tick += 1;
        self.stats.record(started.elapsed(), reaped);
        tracing::debug!(
            tick,
            elapsed_us = self.stats.last_tick_us,
            killed,
            reaped,
            "tick complete"
        );
        Ok(())
    }

    /// Sends one job per system in `phase` and waits for every completion.
    ///
    /// Returns the first system failure once all have reported.
    fn run_phase(&mut self, tick: u64, phase: Range<usize>) -> ScheduleResult<()> {
        let Some(jobs) = &self.jobs else {
            return Err(ScheduleError::Terminated);
        };
        let systems = &self.shared.systems;

        let mut pending = vec![false; systems.len()];
        for index in phase.clone() {
            systems[index].set_state(SystemState::TickRequested);
            if jobs.send(Job { system: index, tick }).is_err() {
                return Err(ScheduleError::Terminated);
            }
            pending[index] = true;
        }

        let mut remaining = phase.len();
        let mut failure = None;
        let timeout = self.config.stall_timeout();

        while remaining > 0 {
            match self.done.recv_timeout(timeout) {
                Ok(completion) if completion.tick != tick => {}
                Ok(completion) => {
                    let waiting = pending
                        .get_mut(completion.system)
                        .is_some_and(|waiting| std::mem::replace(waiting, false));
                    if waiting {
                        remaining -= 1;
                    }
                    if let Err(e) = completion.result {
                        failure.get_or_insert(e);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    self.faulted = true;
                    let pending: Vec<&'static str> = systems
                        .iter()
                        .zip(&pending)
                        .filter(|(_, waiting)| **waiting)
                        .map(|(slot, _)| slot.system.name())
                        .collect();
                    tracing::warn!(tick, ?pending, "tick stalled, scheduler faulted");
                    return Err(ScheduleError::Stalled { tick, pending });
                }
            }
        }

        failure.map_or(Ok(()), Err)
    }

    /// Ticks completed so far.
    #[inline]
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Timing statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// The shared state systems operate on.
    #[must_use]
    pub fn state(&self) -> &Arc<SimState> {
        &self.shared.state
    }

    /// True after a stall.
    #[must_use]
    pub const fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// System names grouped by phase, in run order.
    #[must_use]
    pub fn phases(&self) -> Vec<Vec<&'static str>> {
        self.phases
            .iter()
            .map(|phase| {
                self.shared.systems[phase.clone()]
                    .iter()
                    .map(|slot| slot.system.name())
                    .collect()
            })
            .collect()
    }

    /// Names and states of every registered system, in registration order.
    #[must_use]
    pub fn system_states(&self) -> Vec<(&'static str, SystemState)> {
        self.shared
            .systems
            .iter()
            .map(|slot| (slot.system.name(), slot.state()))
            .collect()
    }

    /// Stops and joins every worker. Idempotent.
    ///
    /// A worker that sees the shutdown flag exits without running any job
    /// still queued.
    pub fn shutdown(&mut self) {
        let Some(jobs) = self.jobs.take() else {
            return;
        };
        self.shared.shutdown.store(true, Ordering::Release);
        drop(jobs);

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("worker panicked before shutdown");
            }
        }
        for slot in &self.shared.systems {
            slot.set_state(SystemState::Terminated);
        }
        tracing::info!(
            ticks = self.stats.ticks,
            avg_tick_ms = self.stats.avg_tick_ms(),
            "scheduler shut down"
        );
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.shutdown();
    }
}
