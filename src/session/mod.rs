// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Editing session orchestration.
//!
//! A [`Session`] owns the note store, editor and playback scheduler of one
//! editing session, together with the user-facing settings (track length,
//! layers, range, tempo, loop). Every settings change goes through here so
//! that pruning, range clamping and playback restarts happen together.
//!
//! Live reconfiguration while playing:
//! - tempo changes restart the clock so the new period applies at once
//! - disabling loop restarts playback
//! - range, length and layer changes re-snap the playhead to the window
//!   start and restart when looping; otherwise the next step picks them up

pub mod notice;

pub use notice::{Notice, Rejection};

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::editor::{Editor, TrackGeometry};
use crate::persistence::SongPayload;
use crate::playback::{PlaybackRange, PlaybackScheduler, RangeWindow, StepContext, StepOutcome};
use crate::score::{NoteEvent, NoteStore, SpatialId, TimeCell};
use crate::sink::{FeedbackSink, NullSink, RenderSink};

/// One user's editing session
pub struct Session {
    config: EngineConfig,
    editor: Editor,
    store: NoteStore,
    scheduler: PlaybackScheduler,
    track_length: usize,
    range: PlaybackRange,
    layer_count: usize,
    active_layer: usize,
    render: Box<dyn RenderSink>,
    feedback: Box<dyn FeedbackSink>,
}

impl Session {
    /// Create a session with default settings; call [`Session::begin`] to
    /// build the track
    pub fn new<R, F>(config: EngineConfig, render: R, feedback: F) -> Self
    where
        R: RenderSink + 'static,
        F: FeedbackSink + 'static,
    {
        let geometry = TrackGeometry::from_config(&config);
        Self {
            editor: Editor::new(geometry),
            store: NoteStore::new(geometry.layer_capacity),
            scheduler: PlaybackScheduler::new(config.tempo.default, false),
            track_length: config.length.default,
            range: PlaybackRange::default(),
            layer_count: 1,
            active_layer: 0,
            render: Box::new(render),
            feedback: Box::new(feedback),
            config,
        }
    }

    /// Session without any collaborators attached
    pub fn headless(config: EngineConfig) -> Self {
        Self::new(config, NullSink, NullSink)
    }

    // --- Lifecycle

    /// Reset every setting, clear the store and build a fresh track
    pub fn begin(&mut self) {
        self.scheduler.stop(self.render.as_mut());
        self.scheduler.set_ticks_per_step(self.config.tempo.default);
        self.scheduler.set_loop_enabled(false);
        self.scheduler.set_playhead(0);

        self.track_length = self.config.length.default;
        self.range.reset();
        self.layer_count = 1;
        self.active_layer = 0;
        self.store.clear();

        self.render.clear_range_overlay();
        self.rebuild_track();
        info!(track_length = self.track_length, "session started");
    }

    /// Stop playback, clear overlays and drop every note
    pub fn end(&mut self) {
        self.scheduler.stop(self.render.as_mut());
        self.render.clear_range_overlay();
        self.store.clear();
        info!("session ended");
    }

    // --- Editing

    /// Place a note of `instrument_id` at a world position on the active layer.
    ///
    /// Returns the cell written, or `None` when the position is off the track.
    pub fn place_note(&mut self, world_pos: SpatialId, instrument_id: u8) -> Option<TimeCell> {
        let cell = self.editor.upsert_note(
            &mut self.store,
            world_pos,
            instrument_id,
            self.active_layer,
            self.track_length,
        )?;
        self.editor.preview_note(self.feedback.as_mut(), instrument_id, cell.pitch_row);
        Some(cell)
    }

    /// Remove the note at a world position
    pub fn remove_note(&mut self, world_pos: SpatialId) -> Option<NoteEvent> {
        let removed = self
            .editor
            .remove_note_at(&mut self.store, self.render.as_mut(), world_pos)?;
        self.feedback.emit_particle(removed.position);
        self.editor
            .preview_note(self.feedback.as_mut(), removed.instrument_id, removed.pitch_row);
        Some(removed)
    }

    // --- Playback

    /// Start when stopped, stop when playing
    pub fn toggle_playback(&mut self) -> Notice {
        if self.scheduler.is_playing() {
            self.stop()
        } else {
            self.play()
        }
    }

    /// Start playback from the beginning of the range window
    pub fn play(&mut self) -> Notice {
        self.park_playhead();
        self.scheduler.start(self.render.as_mut());
        info!(window = ?self.window(), "playback started");
        Notice::PlaybackStarted
    }

    /// Stop playback
    pub fn stop(&mut self) -> Notice {
        self.scheduler.stop(self.render.as_mut());
        Notice::PlaybackStopped
    }

    /// Advance the playback clock by one host tick
    pub fn tick(&mut self) -> StepOutcome {
        let ctx = StepContext {
            store: &self.store,
            track_length: self.track_length,
            range: self.range,
            layer_count: self.layer_count,
            layer_y: self.editor.layer_y(self.active_layer),
            pitch_width: self.editor.geometry().pitch_width,
        };
        self.scheduler
            .tick(&ctx, self.render.as_mut(), self.feedback.as_mut())
    }

    /// The driving context went away; stop at once
    pub fn environment_lost(&mut self) -> Option<Notice> {
        if self.scheduler.stop(self.render.as_mut()) {
            warn!("playback context lost, stopping");
            Some(Notice::PlaybackStopped)
        } else {
            None
        }
    }

    /// Set the tempo in host ticks per step.
    ///
    /// Returns `None` when the clamped value equals the current tempo.
    pub fn set_ticks_per_step(&mut self, ticks_per_step: i64) -> Option<Notice> {
        let ticks_per_step = self.config.tempo.clamp(ticks_per_step);
        if ticks_per_step == self.scheduler.ticks_per_step() {
            return None;
        }

        self.scheduler.set_ticks_per_step(ticks_per_step);
        if self.scheduler.is_playing() {
            self.scheduler.restart(self.render.as_mut());
        }
        debug!(ticks_per_step, "tempo changed");
        Some(Notice::TempoSet(ticks_per_step))
    }

    /// Enable or disable looping
    pub fn set_loop_enabled(&mut self, enabled: bool) -> Notice {
        self.scheduler.set_loop_enabled(enabled);
        if !enabled && self.scheduler.is_playing() {
            self.scheduler.restart(self.render.as_mut());
        }
        Notice::LoopSet(enabled)
    }

    // --- Track length

    /// Grow or shrink the track by `delta` steps.
    ///
    /// Shrinking drops every note past the new end first. Range markers are
    /// pulled back inside the track.
    pub fn adjust_track_length(&mut self, delta: i64) -> Result<Notice, Rejection> {
        let old_length = self.track_length;
        let new_length = self.config.length.clamp((old_length as i64).saturating_add(delta));

        if new_length == old_length {
            return match delta {
                d if d > 0 => Err(Rejection::MaxTrackLength(self.config.length.max)),
                d if d < 0 => Err(Rejection::MinTrackLength(self.config.length.min)),
                _ => Ok(Notice::TrackLengthSet(old_length)),
            };
        }

        if new_length < old_length {
            let geometry = *self.editor.geometry();
            let pruned = self
                .store
                .prune_beyond(new_length, |pos| geometry.project_time(pos));
            if pruned > 0 {
                info!(pruned, new_length, "pruned notes past the new track end");
            }
            self.render.clear_playhead();
            self.render.clear_range_overlay();
        }

        self.track_length = new_length;
        self.range.clamp_to(new_length);
        self.rebuild_track();
        self.restart_if_looping();

        debug!(old_length, new_length, "track length changed");
        Ok(Notice::TrackLengthSet(new_length))
    }

    /// Set the track length outright
    pub fn set_track_length(&mut self, length: usize) -> Result<Notice, Rejection> {
        self.adjust_track_length(length as i64 - self.track_length as i64)
    }

    // --- Range

    /// Set the range begin marker
    pub fn set_range_begin(&mut self, index: usize) -> Notice {
        let index = index.min(self.last_step());
        self.range.begin = Some(index);
        self.redraw_range();
        self.restart_if_looping();
        Notice::RangeBegin(index)
    }

    /// Set the range end marker
    pub fn set_range_end(&mut self, index: usize) -> Notice {
        let index = index.min(self.last_step());
        self.range.end = Some(index);
        self.redraw_range();
        self.restart_if_looping();
        Notice::RangeEnd(index)
    }

    /// Clear both range markers
    pub fn reset_range(&mut self) -> Notice {
        self.range.reset();
        self.redraw_range();
        if self.scheduler.is_playing() {
            self.restart_if_looping();
        } else {
            self.park_playhead();
        }
        Notice::RangeCleared
    }

    // --- Layers

    /// Add a layer on top
    pub fn add_layer(&mut self) -> Result<Notice, Rejection> {
        let capacity = self.store.layer_capacity();
        if self.layer_count >= capacity {
            return Err(Rejection::MaxLayers(capacity));
        }

        self.layer_count += 1;
        self.layers_changed();
        Ok(self.layers_notice())
    }

    /// Remove an empty layer.
    ///
    /// A layer below the top is swapped with the top layer first, so the
    /// remaining layers keep their contents and the count shrinks by one.
    pub fn remove_layer(&mut self, layer_index: usize) -> Result<Notice, Rejection> {
        if layer_index >= self.layer_count {
            return Err(Rejection::NoSuchLayer(layer_index));
        }
        if !self.store.is_layer_empty(layer_index) {
            return Err(Rejection::LayerNotEmpty);
        }
        if self.layer_count <= 1 {
            return Err(Rejection::LastLayer);
        }

        let top = self.layer_count - 1;
        if layer_index != top {
            let geometry = *self.editor.geometry();
            let moved = self.store.swap_layers(layer_index, top, |pos, layer| {
                SpatialId::new(pos.x, geometry.layer_y(layer), pos.z)
            });
            debug!(layer_index, top, moved, "swapped removed layer with top layer");
            self.render.redraw_notes(self.track_length, &self.store);
        }

        self.layer_count -= 1;
        if self.active_layer >= self.layer_count {
            self.active_layer = self.layer_count - 1;
        }
        self.layers_changed();
        Ok(self.layers_notice())
    }

    /// Make the next layer active, wrapping around
    pub fn cycle_active_layer(&mut self) -> Notice {
        self.active_layer = (self.active_layer + 1) % self.layer_count.max(1);
        self.layers_changed();
        Notice::ActiveLayer {
            index: self.active_layer,
            count: self.layer_count,
        }
    }

    /// Layer tool: remove the active layer when it is empty and not the
    /// only one, otherwise add a layer
    pub fn layer_tool(&mut self) -> Result<Notice, Rejection> {
        if self.active_layer >= self.layer_count {
            self.active_layer = 0;
        }
        if self.store.is_layer_empty(self.active_layer) && self.layer_count > 1 {
            self.remove_layer(self.active_layer)
        } else {
            self.add_layer()
        }
    }

    // --- Songs

    /// Snapshot the session as a song payload
    pub fn song_payload(&self) -> SongPayload {
        SongPayload::from_store(
            &self.store,
            self.track_length,
            self.scheduler.ticks_per_step(),
            self.layer_count,
        )
    }

    /// Replace the session contents with a song.
    ///
    /// Playback stops and the range is cleared. Settings are clamped into
    /// the configured limits and out-of-bounds notes are skipped.
    pub fn load_song(&mut self, payload: &SongPayload) -> Notice {
        self.scheduler.stop(self.render.as_mut());
        self.render.clear_range_overlay();
        self.range.reset();

        let ticks_per_step = self.config.tempo.clamp(payload.ticks_per_step);
        self.scheduler.set_ticks_per_step(ticks_per_step);
        self.track_length = self.config.length.clamp(payload.track_length);
        self.layer_count = payload
            .layer_count
            .clamp(1, self.store.layer_capacity() as i64) as usize;
        self.active_layer = self.active_layer.min(self.layer_count - 1);
        self.scheduler.set_playhead(0);

        let stats = payload.apply_to(&mut self.store, &self.editor, self.track_length, self.layer_count);
        self.rebuild_track();

        info!(
            notes = stats.loaded,
            skipped = stats.skipped,
            track_length = self.track_length,
            layers = self.layer_count,
            "song loaded"
        );
        Notice::SongLoaded {
            notes: stats.loaded,
            skipped: stats.skipped,
        }
    }

    // --- Settings surface

    pub fn ticks_per_step(&self) -> u32 {
        self.scheduler.ticks_per_step()
    }

    pub fn track_length(&self) -> usize {
        self.track_length
    }

    pub fn loop_enabled(&self) -> bool {
        self.scheduler.loop_enabled()
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    pub fn active_layer_index(&self) -> usize {
        self.active_layer
    }

    pub fn range(&self) -> PlaybackRange {
        self.range
    }

    pub fn playhead(&self) -> usize {
        self.scheduler.playhead()
    }

    /// Current normalized playback window
    pub fn window(&self) -> RangeWindow {
        self.range.window(self.track_length)
    }

    /// Read-only view of the notes
    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Internals

    fn last_step(&self) -> usize {
        self.track_length.saturating_sub(1)
    }

    fn park_playhead(&mut self) {
        self.scheduler.set_playhead(self.window().start);
    }

    /// Re-snap and restart when playing with loop on
    fn restart_if_looping(&mut self) {
        if self.scheduler.is_playing() && self.scheduler.loop_enabled() {
            self.park_playhead();
            self.scheduler.restart(self.render.as_mut());
        }
    }

    fn layers_changed(&mut self) {
        self.redraw_range();
        self.restart_if_looping();
    }

    fn layers_notice(&self) -> Notice {
        Notice::Layers {
            count: self.layer_count,
            active: self.active_layer,
        }
    }

    fn redraw_range(&mut self) {
        let layer_y = self.editor.layer_y(self.active_layer);
        self.render
            .redraw_range(self.range.begin, self.range.end, self.track_length, layer_y);
    }

    fn rebuild_track(&mut self) {
        self.render.build_track(self.track_length);
        self.redraw_range();
        self.render.redraw_notes(self.track_length, &self.store);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("track_length", &self.track_length)
            .field("range", &self.range)
            .field("layer_count", &self.layer_count)
            .field("active_layer", &self.active_layer)
            .field("scheduler", &self.scheduler)
            .field("notes", &self.store.len())
            .finish()
    }
}
