//! Logarithmic-curve spawn cadence
//!
//! Intervals follow `clamp(base + gain·log_b(t + 1), min, max)` over a local
//! clock, so difficulty ramps quickly at first and then levels off. A firing
//! tick only spawns with `trigger_chance`, which lets several schedulers on
//! the same timeline drift apart, and may spawn a burst instead of one.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::uniform;

/// `base + gain·log_base(t + 1)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogCurve {
    pub base: f32,
    pub gain: f32,
    pub log_base: f32,
}

impl LogCurve {
    pub fn eval(&self, t: f32) -> f32 {
        let shifted = (t + 1.0).max(1.0001);
        let denom = self.log_base.max(1.0001);
        self.base + self.gain * (shifted.ln() / denom.ln())
    }
}

/// Scheduler parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval: LogCurve,
    pub min_interval: f32,
    pub max_interval: f32,
    /// Burst probability curve (clamped to [0, 1] when sampled)
    pub burst_chance: LogCurve,
    pub max_burst: u32,
    /// Probability that a due tick actually spawns
    pub trigger_chance: f32,
    /// Add a random offset in [0, base interval) when a run starts
    pub randomize_initial_phase: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: LogCurve {
                base: 3.0,
                gain: -0.33,
                log_base: 2.0,
            },
            min_interval: 1.0,
            max_interval: 10.0,
            burst_chance: LogCurve {
                base: 0.10,
                gain: 0.05,
                log_base: 2.0,
            },
            max_burst: 3,
            trigger_chance: 0.25,
            randomize_initial_phase: true,
        }
    }
}

/// Local clock plus the next due time
#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    config: SchedulerConfig,
    elapsed: f32,
    next_spawn_at: f32,
}

impl SpawnScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let mut scheduler = Self {
            config,
            elapsed: 0.0,
            next_spawn_at: 0.0,
        };
        scheduler.schedule_from(0.0);
        scheduler
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn next_spawn_at(&self) -> f32 {
        self.next_spawn_at
    }

    /// Interval at local time `t`, always within [min, max]
    pub fn compute_interval(&self, t: f32) -> f32 {
        let lo = self.config.min_interval.min(self.config.max_interval);
        let hi = self.config.min_interval.max(self.config.max_interval);
        self.config.interval.eval(t).clamp(lo, hi)
    }

    /// Burst probability at local time `t`
    pub fn burst_chance(&self, t: f32) -> f32 {
        self.config.burst_chance.eval(t).clamp(0.0, 1.0)
    }

    fn schedule_from(&mut self, t: f32) {
        self.next_spawn_at = t + self.compute_interval(t);
    }

    /// Restart the curve; a run start may offset the first spawn by a random phase
    pub fn reset<R: Rng>(&mut self, randomize_phase: bool, rng: &mut R) {
        self.elapsed = 0.0;
        self.schedule_from(0.0);
        if randomize_phase && self.config.randomize_initial_phase {
            self.next_spawn_at += uniform(rng, 0.0, self.config.interval.base.max(0.0));
        }
    }

    /// Advance the clock; returns how many entities to spawn this frame
    pub fn update<R: Rng>(&mut self, dt: f32, rng: &mut R) -> u32 {
        self.elapsed += dt.max(0.0);
        if self.elapsed < self.next_spawn_at {
            return 0;
        }

        let t = self.elapsed;
        let count = if rng.random::<f32>() < self.config.trigger_chance {
            self.burst_size(t, rng)
        } else {
            0
        };
        self.schedule_from(t);
        count
    }

    fn burst_size<R: Rng>(&self, t: f32, rng: &mut R) -> u32 {
        let max_burst = self.config.max_burst.max(1);
        if max_burst >= 2 && rng.random::<f32>() < self.burst_chance(t) {
            rng.random_range(2..=max_burst)
        } else {
            1
        }
    }
}
