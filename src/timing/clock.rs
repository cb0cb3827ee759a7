// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Discrete step clock.
//!
//! The host drives the engine with a fixed-rate tick (20 per second by
//! default). A [`StepClock`] divides that tick down to sequencer steps:
//! it fires on the first host tick after it is armed and then every
//! `ticks_per_step` host ticks.

use std::time::Duration;

/// Default host tick rate
pub const HOST_TICKS_PER_SECOND: u32 = 20;

/// Host tick divider producing sequencer steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepClock {
    /// Host ticks per step (at least 1)
    ticks_per_step: u32,
    /// Host ticks left before the next step fires
    until_next: u32,
    /// Steps fired since the clock was armed
    steps: u64,
}

impl StepClock {
    /// Arm a clock; the first step fires on the next host tick
    pub fn new(ticks_per_step: u32) -> Self {
        Self {
            ticks_per_step: ticks_per_step.max(1),
            until_next: 0,
            steps: 0,
        }
    }

    /// Get the step period in host ticks
    pub fn ticks_per_step(&self) -> u32 {
        self.ticks_per_step
    }

    /// Get the number of steps fired so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advance one host tick; returns true when a step is due
    pub fn tick(&mut self) -> bool {
        if self.until_next == 0 {
            self.until_next = self.ticks_per_step - 1;
            self.steps += 1;
            true
        } else {
            self.until_next -= 1;
            false
        }
    }

    /// Host ticks until the next step fires (0 = on the next tick)
    pub fn ticks_until_next_step(&self) -> u32 {
        self.until_next
    }

    /// Wall-clock duration of one step at a host tick rate
    pub fn step_interval(&self, host_ticks_per_second: u32) -> Duration {
        step_interval(self.ticks_per_step, host_ticks_per_second)
    }
}

/// Wall-clock duration of one host tick
pub fn host_tick_interval(host_ticks_per_second: u32) -> Duration {
    Duration::from_secs_f64(1.0 / host_ticks_per_second.max(1) as f64)
}

/// Wall-clock duration of one step
pub fn step_interval(ticks_per_step: u32, host_ticks_per_second: u32) -> Duration {
    host_tick_interval(host_ticks_per_second) * ticks_per_step.max(1)
}

/// Steps per second at a tempo, for display
pub fn steps_per_second(ticks_per_step: u32, host_ticks_per_second: u32) -> f64 {
    host_ticks_per_second as f64 / ticks_per_step.max(1) as f64
}
