// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note editing.
//!
//! This module provides:
//! - Mapping between world positions and timeline cells
//! - Note placement and removal against a [`NoteStore`]
//! - The pitch-row to audio-parameter mapping used for previews and playback
//! - The instrument palette

pub mod palette;

pub use palette::{pitch_name, Instrument, INSTRUMENT_COUNT};

use crate::config::EngineConfig;
use crate::score::{NoteEvent, NoteStore, SpatialId, TimeCell};
use crate::sink::{FeedbackSink, RenderSink};

/// Lowest pitch parameter (row 0)
pub const PITCH_PARAM_MIN: f32 = 0.5;
/// Span of the pitch parameter across all rows
pub const PITCH_PARAM_SPAN: f32 = 1.5;

/// Map a pitch row to a continuous audio parameter.
///
/// Row 0 maps to 0.5 and row `pitch_width - 1` maps to 2.0.
pub fn pitch_parameter(pitch_row: usize, pitch_width: usize) -> f32 {
    let denominator = pitch_width.saturating_sub(1).max(1) as f32;
    PITCH_PARAM_MIN + (pitch_row as f32 / denominator) * PITCH_PARAM_SPAN
}

/// Placement of the track in world space.
///
/// X is time, Z is pitch row and each layer occupies one Y plane above
/// `track_y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackGeometry {
    /// World X of time index 0
    pub origin_x: i32,
    /// World Z of pitch row 0
    pub origin_z: i32,
    /// World Y of layer 0
    pub track_y: i32,
    /// Number of pitch rows
    pub pitch_width: usize,
    /// Number of layer planes
    pub layer_capacity: usize,
}

impl TrackGeometry {
    /// Build the geometry described by a config, with at least one layer
    /// plane and one pitch row
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            origin_x: config.track.origin_x,
            origin_z: config.track.origin_z,
            track_y: config.track.track_y,
            pitch_width: config.track.pitch_width.max(1),
            layer_capacity: config.track.layer_capacity.max(1),
        }
    }

    /// World Y of a layer plane
    pub fn layer_y(&self, layer_index: usize) -> i32 {
        self.track_y + layer_index as i32
    }

    /// Time index a position projects onto (may be negative or past the track)
    pub fn project_time(&self, pos: &SpatialId) -> i64 {
        pos.x as i64 - self.origin_x as i64
    }
}

impl Default for TrackGeometry {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// World-editing operations on the timeline
#[derive(Debug, Clone)]
pub struct Editor {
    geometry: TrackGeometry,
}

impl Editor {
    /// Create an editor for a track geometry
    pub fn new(geometry: TrackGeometry) -> Self {
        Self { geometry }
    }

    /// Get the track geometry
    pub fn geometry(&self) -> &TrackGeometry {
        &self.geometry
    }

    /// Map a world position onto the track, or `None` when it is off the track
    pub fn to_cell(&self, world_pos: SpatialId, track_length: usize) -> Option<TimeCell> {
        let g = &self.geometry;
        let dy = world_pos.y as i64 - g.track_y as i64;
        if dy < 0 || dy >= g.layer_capacity as i64 {
            return None;
        }

        let dx = g.project_time(&world_pos);
        let dz = world_pos.z as i64 - g.origin_z as i64;
        if dx < 0 || dx >= track_length as i64 {
            return None;
        }
        if dz < 0 || dz >= g.pitch_width as i64 {
            return None;
        }

        Some(TimeCell::new(dx as usize, dz as usize))
    }

    /// World position of a cell on a layer
    pub fn world_position(&self, cell: TimeCell, layer_index: usize) -> SpatialId {
        let g = &self.geometry;
        SpatialId::new(
            g.origin_x + cell.time_index as i32,
            g.layer_y(layer_index),
            g.origin_z + cell.pitch_row as i32,
        )
    }

    /// World Y of a layer plane
    pub fn layer_y(&self, layer_index: usize) -> i32 {
        self.geometry.layer_y(layer_index)
    }

    /// Place (or replace) a note at a world position.
    ///
    /// Returns the cell written, or `None` when the position is off the track.
    pub fn upsert_note(
        &self,
        store: &mut NoteStore,
        world_pos: SpatialId,
        instrument_id: u8,
        layer_index: usize,
        track_length: usize,
    ) -> Option<TimeCell> {
        let cell = self.to_cell(world_pos, track_length)?;
        store.upsert(cell, world_pos, instrument_id, layer_index);
        Some(cell)
    }

    /// Remove the note at a world position and clear its marker
    pub fn remove_note_at(
        &self,
        store: &mut NoteStore,
        render: &mut dyn RenderSink,
        world_pos: SpatialId,
    ) -> Option<NoteEvent> {
        let removed = store.remove_at(world_pos)?;
        render.clear_marker(world_pos);
        Some(removed)
    }

    /// Play a single note as audible feedback
    pub fn preview_note(&self, feedback: &mut dyn FeedbackSink, instrument_id: u8, pitch_row: usize) {
        feedback.play_note(instrument_id, self.pitch_from_row(pitch_row));
    }

    /// Pitch parameter for a row on this track
    pub fn pitch_from_row(&self, pitch_row: usize) -> f32 {
        pitch_parameter(pitch_row, self.geometry.pitch_width)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(TrackGeometry::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{RecordingSink, SinkCall};

    fn geometry() -> TrackGeometry {
        TrackGeometry {
            origin_x: 0,
            origin_z: 0,
            track_y: 65,
            pitch_width: 25,
            layer_capacity: 4,
        }
    }

    #[test]
    fn test_pitch_parameter_endpoints() {
        assert_eq!(pitch_parameter(0, 25), 0.5);
        assert_eq!(pitch_parameter(24, 25), 2.0);
        assert!((pitch_parameter(12, 25) - 1.25).abs() < 1e-6);
        assert!((pitch_parameter(5, 25) - (0.5 + 5.0 / 24.0 * 1.5)).abs() < 1e-6);
    }

    #[test]
    fn test_to_cell_bounds() {
        let editor = Editor::new(geometry());

        assert_eq!(editor.to_cell(SpatialId::new(10, 65, 5), 100), Some(TimeCell::new(10, 5)));
        assert_eq!(editor.to_cell(SpatialId::new(99, 68, 24), 100), Some(TimeCell::new(99, 24)));

        assert!(editor.to_cell(SpatialId::new(100, 65, 0), 100).is_none());
        assert!(editor.to_cell(SpatialId::new(-1, 65, 0), 100).is_none());
        assert!(editor.to_cell(SpatialId::new(0, 65, 25), 100).is_none());
        assert!(editor.to_cell(SpatialId::new(0, 64, 0), 100).is_none());
        assert!(editor.to_cell(SpatialId::new(0, 69, 0), 100).is_none());
    }

    #[test]
    fn test_to_cell_with_offset_origin() {
        let editor = Editor::new(TrackGeometry {
            origin_x: -20,
            origin_z: 7,
            ..geometry()
        });
        assert_eq!(editor.to_cell(SpatialId::new(-20, 65, 7), 10), Some(TimeCell::new(0, 0)));
        assert!(editor.to_cell(SpatialId::new(-10, 65, 7), 10).is_none());
    }

    #[test]
    fn test_world_position_round_trips() {
        let editor = Editor::new(geometry());
        let cell = TimeCell::new(42, 17);
        let pos = editor.world_position(cell, 2);
        assert_eq!(pos, SpatialId::new(42, 67, 17));
        assert_eq!(editor.to_cell(pos, 100), Some(cell));
    }

    #[test]
    fn test_upsert_out_of_bounds_is_noop() {
        let editor = Editor::new(geometry());
        let mut store = NoteStore::new(4);

        assert!(editor.upsert_note(&mut store, SpatialId::new(150, 65, 3), 1, 0, 100).is_none());
        assert!(store.is_empty());

        assert!(editor.upsert_note(&mut store, SpatialId::new(15, 65, 3), 1, 0, 100).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_clears_marker() {
        let editor = Editor::new(geometry());
        let mut store = NoteStore::new(4);
        let mut render = RecordingSink::new();
        let pos = SpatialId::new(4, 65, 4);

        editor.upsert_note(&mut store, pos, 9, 0, 100);
        let removed = editor.remove_note_at(&mut store, &mut render, pos);

        assert_eq!(removed.map(|n| n.instrument_id), Some(9));
        assert_eq!(render.calls(), vec![SinkCall::ClearMarker(pos)]);

        assert!(editor.remove_note_at(&mut store, &mut render, pos).is_none());
        assert_eq!(render.calls().len(), 1);
    }

    #[test]
    fn test_preview_note() {
        let editor = Editor::new(geometry());
        let mut feedback = RecordingSink::new();
        editor.preview_note(&mut feedback, 4, 24);
        assert_eq!(feedback.played_notes(), vec![(4, 2.0)]);
    }
}
