//! Tick timing statistics.

use std::time::Duration;

/// Running totals over every completed tick.
#[derive(Clone, Debug)]
pub struct TickStats {
    /// Ticks completed.
    pub ticks: u64,
    /// Duration of the latest tick in microseconds.
    pub last_tick_us: u64,
    /// Sum of tick durations in microseconds.
    pub total_tick_us: u64,
    /// Fastest tick in microseconds.
    pub min_tick_us: u64,
    /// Slowest tick in microseconds.
    pub max_tick_us: u64,
    /// Dead entities reclaimed after the barrier.
    pub reaped: u64,
}

impl Default for TickStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TickStats {
    /// Creates empty statistics.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ticks: 0,
            last_tick_us: 0,
            total_tick_us: 0,
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            reaped: 0,
        }
    }

    /// Records one completed tick.
    pub fn record(&mut self, elapsed: Duration, reaped: usize) {
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.ticks += 1;
        self.last_tick_us = us;
        self.total_tick_us = self.total_tick_us.saturating_add(us);
        self.min_tick_us = self.min_tick_us.min(us);
        self.max_tick_us = self.max_tick_us.max(us);
        self.reaped += reaped as u64;
    }

    /// Average tick duration in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_tick_ms(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        (self.total_tick_us as f64 / self.ticks as f64) / 1000.0
    }
}
