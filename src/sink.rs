// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Collaborator interfaces.
//!
//! The engine never owns pixels, blocks or sound devices. It calls a
//! [`RenderSink`] for visual state and a [`FeedbackSink`] for sounds and
//! particles. Three implementations ship with the crate:
//! - [`NullSink`]: ignores everything
//! - [`TracingSink`]: logs every call through `tracing`
//! - [`RecordingSink`]: captures calls for inspection (headless runs, tests)

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::editor::{pitch_name, Instrument};
use crate::score::{NoteStore, SpatialId};

/// Visual grid collaborator
pub trait RenderSink: Send {
    /// Build (or rebuild) the empty track for `length` steps
    fn build_track(&mut self, length: usize);

    /// Redraw every note marker inside `length`
    fn redraw_notes(&mut self, length: usize, score: &NoteStore);

    /// Draw the playhead column at `index` on the plane `layer_y`
    fn draw_playhead(&mut self, index: usize, layer_y: i32);

    /// Remove the playhead column
    fn clear_playhead(&mut self);

    /// Remove the range markers
    fn clear_range_overlay(&mut self);

    /// Redraw the range markers for the current bounds
    fn redraw_range(&mut self, begin: Option<usize>, end: Option<usize>, length: usize, layer_y: i32) {
        let _ = (begin, end, length, layer_y);
        self.clear_range_overlay();
    }

    /// Clear the marker of a removed note
    fn clear_marker(&mut self, position: SpatialId);
}

/// Audio/visual feedback collaborator
pub trait FeedbackSink: Send {
    /// Play an instrument at a continuous pitch parameter
    fn play_note(&mut self, instrument_id: u8, parameter: f32);

    /// Spawn a note particle at a position
    fn emit_particle(&mut self, position: SpatialId);
}

/// Sink that ignores every call
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn build_track(&mut self, _length: usize) {}
    fn redraw_notes(&mut self, _length: usize, _score: &NoteStore) {}
    fn draw_playhead(&mut self, _index: usize, _layer_y: i32) {}
    fn clear_playhead(&mut self) {}
    fn clear_range_overlay(&mut self) {}
    fn clear_marker(&mut self, _position: SpatialId) {}
}

impl FeedbackSink for NullSink {
    fn play_note(&mut self, _instrument_id: u8, _parameter: f32) {}
    fn emit_particle(&mut self, _position: SpatialId) {}
}

/// Sink that logs calls, used by the headless player
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl RenderSink for TracingSink {
    fn build_track(&mut self, length: usize) {
        debug!(length, "build track");
    }

    fn redraw_notes(&mut self, length: usize, score: &NoteStore) {
        debug!(length, notes = score.len(), "redraw notes");
    }

    fn draw_playhead(&mut self, index: usize, layer_y: i32) {
        debug!(index, layer_y, "playhead");
    }

    fn clear_playhead(&mut self) {
        debug!("clear playhead");
    }

    fn clear_range_overlay(&mut self) {
        debug!("clear range overlay");
    }

    fn redraw_range(&mut self, begin: Option<usize>, end: Option<usize>, length: usize, _layer_y: i32) {
        debug!(?begin, ?end, length, "redraw range");
    }

    fn clear_marker(&mut self, position: SpatialId) {
        debug!(%position, "clear marker");
    }
}

impl FeedbackSink for TracingSink {
    fn play_note(&mut self, instrument_id: u8, parameter: f32) {
        info!(
            instrument = %Instrument::from_id(instrument_id),
            parameter = f64::from(parameter),
            "note"
        );
    }

    fn emit_particle(&mut self, position: SpatialId) {
        debug!(%position, "particle");
    }
}

/// A single captured sink call
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    BuildTrack(usize),
    RedrawNotes { length: usize, notes: usize },
    DrawPlayhead { index: usize, layer_y: i32 },
    ClearPlayhead,
    ClearRangeOverlay,
    RedrawRange { begin: Option<usize>, end: Option<usize>, length: usize },
    ClearMarker(SpatialId),
    PlayNote { instrument_id: u8, parameter: f32 },
    EmitParticle(SpatialId),
}

/// Sink that records every call into a shared log.
///
/// Clones share the same log, so one clone can be handed to a session
/// while another is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl RecordingSink {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, Vec<SinkCall>> {
        // A poisoned log still holds valid calls.
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, call: SinkCall) {
        self.log().push(call);
    }

    /// Snapshot of all recorded calls
    pub fn calls(&self) -> Vec<SinkCall> {
        self.log().clone()
    }

    /// Take and clear the recorded calls
    pub fn take(&self) -> Vec<SinkCall> {
        std::mem::take(&mut *self.log())
    }

    /// Forget all recorded calls
    pub fn clear(&self) {
        self.log().clear();
    }

    /// Recorded `play_note` calls as `(instrument_id, parameter)`
    pub fn played_notes(&self) -> Vec<(u8, f32)> {
        self.log()
            .iter()
            .filter_map(|call| match call {
                SinkCall::PlayNote {
                    instrument_id,
                    parameter,
                } => Some((*instrument_id, *parameter)),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded calls equal to `call`
    pub fn count(&self, call: &SinkCall) -> usize {
        self.log().iter().filter(|c| *c == call).count()
    }
}

impl RenderSink for RecordingSink {
    fn build_track(&mut self, length: usize) {
        self.push(SinkCall::BuildTrack(length));
    }

    fn redraw_notes(&mut self, length: usize, score: &NoteStore) {
        self.push(SinkCall::RedrawNotes {
            length,
            notes: score.len(),
        });
    }

    fn draw_playhead(&mut self, index: usize, layer_y: i32) {
        self.push(SinkCall::DrawPlayhead { index, layer_y });
    }

    fn clear_playhead(&mut self) {
        self.push(SinkCall::ClearPlayhead);
    }

    fn clear_range_overlay(&mut self) {
        self.push(SinkCall::ClearRangeOverlay);
    }

    fn redraw_range(&mut self, begin: Option<usize>, end: Option<usize>, length: usize, _layer_y: i32) {
        self.push(SinkCall::RedrawRange { begin, end, length });
    }

    fn clear_marker(&mut self, position: SpatialId) {
        self.push(SinkCall::ClearMarker(position));
    }
}

impl FeedbackSink for RecordingSink {
    fn play_note(&mut self, instrument_id: u8, parameter: f32) {
        self.push(SinkCall::PlayNote {
            instrument_id,
            parameter,
        });
    }

    fn emit_particle(&mut self, position: SpatialId) {
        self.push(SinkCall::EmitParticle(position));
    }
}

/// Log line for a note, e.g. `Bell D#1`
pub fn describe_note(instrument_id: u8, pitch_row: usize) -> String {
    format!("{} {}", Instrument::from_id(instrument_id), pitch_name(pitch_row as i64))
}
