// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback module.
//!
//! This module provides:
//! - Range windows derived from optional begin/end markers
//! - The playback scheduler state machine
//! - A real-time driver feeding host ticks to a session

pub mod driver;
pub mod range;
pub mod scheduler;

pub use driver::{run, DriverOptions, DriverReport};
pub use range::{playback_end_exclusive, playback_start_index, PlaybackRange, RangeWindow};
pub use scheduler::{emit_notes_at, PlaybackScheduler, PlaybackState, StepContext, StepOutcome};
