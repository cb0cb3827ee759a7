// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback scheduler.
//!
//! A single-timeline state machine (`Stopped` / `Playing`). While playing, a
//! [`StepClock`] divides host ticks into steps; every step re-reads the
//! current settings, draws the playhead, emits the notes due at the playhead
//! and advances it, looping or finishing at the end of the range window.

use tracing::{debug, info};

use super::range::{PlaybackRange, RangeWindow};
use crate::editor::pitch_parameter;
use crate::score::NoteStore;
use crate::sink::{FeedbackSink, RenderSink};
use crate::timing::StepClock;

/// Scheduler state; "is playing" is derived from the tag
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing {
        /// Clock armed at start, with the period captured then
        clock: StepClock,
    },
}

/// What a host tick or step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Not playing, or no step due on this host tick
    Idle,
    /// Played `tick` and advanced
    Stepped { tick: usize },
    /// Played `tick`, the last of the window, and wrapped to the start
    Looped { tick: usize },
    /// Played `tick`, the last of the window, and stopped
    Finished { tick: usize },
    /// The window is empty; playback stopped without playing anything
    InvalidRange,
}

/// Settings read fresh on every step
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// Notes to play
    pub store: &'a NoteStore,
    /// Current track length
    pub track_length: usize,
    /// Current range markers
    pub range: PlaybackRange,
    /// Number of layers in use
    pub layer_count: usize,
    /// Plane the playhead is drawn on
    pub layer_y: i32,
    /// Pitch rows on the track
    pub pitch_width: usize,
}

impl StepContext<'_> {
    /// Normalized playback window
    pub fn window(&self) -> RangeWindow {
        self.range.window(self.track_length)
    }
}

/// Playback scheduler
#[derive(Debug, Clone)]
pub struct PlaybackScheduler {
    /// Stopped or playing
    state: PlaybackState,
    /// Current step position
    playhead: usize,
    /// Host ticks per step used by the next start
    ticks_per_step: u32,
    /// Wrap at the end of the window instead of finishing
    loop_enabled: bool,
}

impl PlaybackScheduler {
    /// Create a stopped scheduler
    pub fn new(ticks_per_step: u32, loop_enabled: bool) -> Self {
        Self {
            state: PlaybackState::Stopped,
            playhead: 0,
            ticks_per_step: ticks_per_step.max(1),
            loop_enabled,
        }
    }

    /// Get the current state
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Check if playing
    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing { .. })
    }

    /// Get the playhead
    pub fn playhead(&self) -> usize {
        self.playhead
    }

    /// Move the playhead; it is snapped into the window on the next step
    pub fn set_playhead(&mut self, playhead: usize) {
        self.playhead = playhead;
    }

    /// Get the step period in host ticks
    pub fn ticks_per_step(&self) -> u32 {
        self.ticks_per_step
    }

    /// Set the step period; a running clock keeps its period until restarted
    pub fn set_ticks_per_step(&mut self, ticks_per_step: u32) {
        self.ticks_per_step = ticks_per_step.max(1);
    }

    /// Check if looping is enabled
    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    /// Enable or disable looping
    pub fn set_loop_enabled(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    /// Start playback, stopping first if already playing
    pub fn start(&mut self, render: &mut dyn RenderSink) {
        if self.is_playing() {
            self.stop(render);
        }
        self.state = PlaybackState::Playing {
            clock: StepClock::new(self.ticks_per_step),
        };
        debug!(
            playhead = self.playhead,
            ticks_per_step = self.ticks_per_step,
            loop_enabled = self.loop_enabled,
            "playback started"
        );
    }

    /// Stop playback.
    ///
    /// Safe to call in any state; always clears the playhead overlay.
    /// Returns whether playback was running.
    pub fn stop(&mut self, render: &mut dyn RenderSink) -> bool {
        let was_playing = self.is_playing();
        self.state = PlaybackState::Stopped;
        render.clear_playhead();
        if was_playing {
            debug!(playhead = self.playhead, "playback stopped");
        }
        was_playing
    }

    /// Stop, then start with the current settings
    pub fn restart(&mut self, render: &mut dyn RenderSink) {
        self.stop(render);
        self.start(render);
    }

    /// Advance the clock by one host tick, stepping when a step is due
    pub fn tick(
        &mut self,
        ctx: &StepContext<'_>,
        render: &mut dyn RenderSink,
        feedback: &mut dyn FeedbackSink,
    ) -> StepOutcome {
        let due = match &mut self.state {
            PlaybackState::Stopped => return StepOutcome::Idle,
            PlaybackState::Playing { clock } => clock.tick(),
        };
        if due {
            self.step(ctx, render, feedback)
        } else {
            StepOutcome::Idle
        }
    }

    /// Run one step immediately
    pub fn step(
        &mut self,
        ctx: &StepContext<'_>,
        render: &mut dyn RenderSink,
        feedback: &mut dyn FeedbackSink,
    ) -> StepOutcome {
        if !self.is_playing() {
            return StepOutcome::Idle;
        }

        let window = ctx.window();
        if window.is_empty() {
            self.stop(render);
            info!(?window, "invalid playback range");
            return StepOutcome::InvalidRange;
        }

        if !window.contains(self.playhead) {
            self.playhead = window.start;
        }

        let tick = self.playhead;
        render.draw_playhead(tick, ctx.layer_y);
        emit_notes_at(ctx, tick, feedback);

        self.playhead += 1;
        if self.playhead < window.end_exclusive {
            return StepOutcome::Stepped { tick };
        }

        if self.loop_enabled {
            self.playhead = window.start;
            StepOutcome::Looped { tick }
        } else {
            self.stop(render);
            info!(tick, "playback finished");
            StepOutcome::Finished { tick }
        }
    }
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new(2, false)
    }
}

/// Emit every note due at `tick`, ascending by layer then in bucket order
pub fn emit_notes_at(ctx: &StepContext<'_>, tick: usize, feedback: &mut dyn FeedbackSink) -> usize {
    let layers = ctx.layer_count.min(ctx.store.layer_capacity());
    let mut emitted = 0;

    for layer in 0..layers {
        let Some(bucket) = ctx.store.bucket(layer, tick) else {
            continue;
        };
        for note in bucket {
            feedback.play_note(note.instrument_id, pitch_parameter(note.pitch_row, ctx.pitch_width));
            feedback.emit_particle(note.position);
            emitted += 1;
        }
    }
    emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{SpatialId, TimeCell};
    use crate::sink::{NullSink, RecordingSink, SinkCall};

    fn ctx(store: &NoteStore, track_length: usize, range: PlaybackRange, layer_count: usize) -> StepContext<'_> {
        StepContext {
            store,
            track_length,
            range,
            layer_count,
            layer_y: 65,
            pitch_width: 25,
        }
    }

    fn add(store: &mut NoteStore, tick: usize, pitch: usize, instrument: u8, layer: usize) {
        let pos = SpatialId::new(tick as i32, 65 + layer as i32, pitch as i32);
        store.upsert(TimeCell::new(tick, pitch), pos, instrument, layer);
    }

    #[test]
    fn test_scheduler_creation() {
        let scheduler = PlaybackScheduler::new(2, false);
        assert!(!scheduler.is_playing());
        assert_eq!(scheduler.state(), &PlaybackState::Stopped);
        assert_eq!(scheduler.playhead(), 0);
        assert_eq!(scheduler.ticks_per_step(), 2);
        assert!(!scheduler.loop_enabled());
    }

    #[test]
    fn test_stop_is_idempotent_and_always_clears() {
        let mut scheduler = PlaybackScheduler::new(2, false);
        let mut render = RecordingSink::new();

        assert!(!scheduler.stop(&mut render));
        assert!(!scheduler.stop(&mut render));
        assert_eq!(render.count(&SinkCall::ClearPlayhead), 2);

        scheduler.start(&mut render);
        render.clear();
        assert!(scheduler.stop(&mut render));
        assert_eq!(render.calls(), vec![SinkCall::ClearPlayhead]);
    }

    #[test]
    fn test_start_clears_playhead_only_when_playing() {
        let mut scheduler = PlaybackScheduler::new(2, false);
        let mut render = RecordingSink::new();

        scheduler.start(&mut render);
        assert!(render.calls().is_empty());

        scheduler.restart(&mut render);
        assert_eq!(render.count(&SinkCall::ClearPlayhead), 1);

        render.clear();
        scheduler.start(&mut render);
        assert_eq!(render.calls(), vec![SinkCall::ClearPlayhead]);
    }

    #[test]
    fn test_start_while_playing_restarts() {
        let mut scheduler = PlaybackScheduler::new(4, false);
        let mut render = RecordingSink::new();
        scheduler.start(&mut render);

        scheduler.set_ticks_per_step(1);
        scheduler.start(&mut render);

        match scheduler.state() {
            PlaybackState::Playing { clock } => assert_eq!(clock.ticks_per_step(), 1),
            PlaybackState::Stopped => panic!("expected playing"),
        }
    }

    #[test]
    fn test_tick_respects_period() {
        let store = NoteStore::new(4);
        let mut scheduler = PlaybackScheduler::new(2, false);
        let mut sink = NullSink;
        scheduler.start(&mut sink);

        let c = ctx(&store, 100, PlaybackRange::default(), 1);
        let outcomes: Vec<StepOutcome> = (0..4).map(|_| scheduler.tick(&c, &mut sink, &mut NullSink)).collect();
        assert_eq!(
            outcomes,
            vec![
                StepOutcome::Stepped { tick: 0 },
                StepOutcome::Idle,
                StepOutcome::Stepped { tick: 1 },
                StepOutcome::Idle,
            ]
        );
        assert_eq!(scheduler.playhead(), 2);
    }

    #[test]
    fn test_step_when_stopped_is_idle() {
        let store = NoteStore::new(4);
        let mut scheduler = PlaybackScheduler::new(1, false);
        let c = ctx(&store, 10, PlaybackRange::default(), 1);
        assert_eq!(scheduler.step(&c, &mut NullSink, &mut NullSink), StepOutcome::Idle);
        assert_eq!(scheduler.tick(&c, &mut NullSink, &mut NullSink), StepOutcome::Idle);
    }

    #[test]
    fn test_playhead_snaps_into_window() {
        let store = NoteStore::new(4);
        let mut scheduler = PlaybackScheduler::new(1, false);
        let mut render = RecordingSink::new();
        scheduler.set_playhead(90);
        scheduler.start(&mut render);

        let c = ctx(&store, 100, PlaybackRange::new(20, 10), 1);
        assert_eq!(scheduler.step(&c, &mut render, &mut NullSink), StepOutcome::Stepped { tick: 10 });
        assert!(render.calls().contains(&SinkCall::DrawPlayhead { index: 10, layer_y: 65 }));
    }

    #[test]
    fn test_finish_without_loop() {
        let store = NoteStore::new(4);
        let mut scheduler = PlaybackScheduler::new(1, false);
        let mut render = RecordingSink::new();
        scheduler.start(&mut render);

        let c = ctx(&store, 3, PlaybackRange::default(), 1);
        assert_eq!(scheduler.step(&c, &mut render, &mut NullSink), StepOutcome::Stepped { tick: 0 });
        assert_eq!(scheduler.step(&c, &mut render, &mut NullSink), StepOutcome::Stepped { tick: 1 });
        assert_eq!(scheduler.step(&c, &mut render, &mut NullSink), StepOutcome::Finished { tick: 2 });
        assert!(!scheduler.is_playing());
        assert_eq!(render.calls().last(), Some(&SinkCall::ClearPlayhead));
    }

    #[test]
    fn test_loop_wraps_to_window_start() {
        let store = NoteStore::new(4);
        let mut scheduler = PlaybackScheduler::new(1, true);
        scheduler.start(&mut NullSink);

        let c = ctx(&store, 100, PlaybackRange::default(), 1);
        for _ in 0..99 {
            scheduler.step(&c, &mut NullSink, &mut NullSink);
        }
        assert_eq!(scheduler.playhead(), 99);
        assert_eq!(scheduler.step(&c, &mut NullSink, &mut NullSink), StepOutcome::Looped { tick: 99 });
        assert_eq!(scheduler.playhead(), 0);

        for _ in 0..250 {
            scheduler.step(&c, &mut NullSink, &mut NullSink);
        }
        assert!(scheduler.is_playing());
    }

    #[test]
    fn test_invalid_range_stops() {
        let store = NoteStore::new(4);
        let mut scheduler = PlaybackScheduler::new(1, true);
        let mut render = RecordingSink::new();
        scheduler.start(&mut render);

        let c = ctx(&store, 0, PlaybackRange::default(), 1);
        assert_eq!(scheduler.step(&c, &mut render, &mut NullSink), StepOutcome::InvalidRange);
        assert!(!scheduler.is_playing());
        assert_eq!(render.count(&SinkCall::DrawPlayhead { index: 0, layer_y: 65 }), 0);
    }

    #[test]
    fn test_emits_in_layer_then_insertion_order() {
        let mut store = NoteStore::new(4);
        add(&mut store, 4, 10, 3, 1);
        add(&mut store, 4, 0, 1, 0);
        add(&mut store, 4, 24, 2, 0);
        add(&mut store, 4, 5, 9, 2);

        let mut feedback = RecordingSink::new();
        let c = ctx(&store, 10, PlaybackRange::default(), 3);
        assert_eq!(emit_notes_at(&c, 4, &mut feedback), 4);

        let instruments: Vec<u8> = feedback.played_notes().iter().map(|(i, _)| *i).collect();
        assert_eq!(instruments, vec![1, 2, 3, 9]);
    }

    #[test]
    fn test_layers_beyond_count_are_silent() {
        let mut store = NoteStore::new(4);
        add(&mut store, 0, 0, 1, 0);
        add(&mut store, 0, 0, 2, 3);

        let mut feedback = RecordingSink::new();
        let c = ctx(&store, 10, PlaybackRange::default(), 2);
        emit_notes_at(&c, 0, &mut feedback);
        assert_eq!(feedback.played_notes(), vec![(1, 0.5)]);
    }
}
