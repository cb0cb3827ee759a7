// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing and clock module.
//!
//! This module provides the host-tick step clock and interval helpers
//! for the playback scheduler.

pub mod clock;

pub use clock::{host_tick_interval, step_interval, steps_per_second, StepClock, HOST_TICKS_PER_SECOND};
