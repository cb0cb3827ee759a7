// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Score data model.
//!
//! This module provides the note value types and the [`NoteStore`], which
//! keeps notes in per-layer tick buckets plus a reverse index from spatial
//! identity to bucket location.

pub mod store;

pub use store::NoteStore;

use std::fmt;

/// Opaque position key identifying where a note is visually anchored.
///
/// `x` runs along the time axis, `y` selects the layer plane and `z` runs
/// along the pitch axis. Only used for lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpatialId {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl SpatialId {
    /// Create a new spatial id
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for SpatialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Logical coordinate of a note within one layer's timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeCell {
    /// Offset along the playback axis
    pub time_index: usize,
    /// Pitch lane (0..pitch_width)
    pub pitch_row: usize,
}

impl TimeCell {
    /// Create a new cell
    pub fn new(time_index: usize, pitch_row: usize) -> Self {
        Self {
            time_index,
            pitch_row,
        }
    }
}

/// A note placed on the track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    /// Where the note is anchored
    pub position: SpatialId,
    /// Palette instrument id (0-15)
    pub instrument_id: u8,
    /// Pitch row (0..pitch_width)
    pub pitch_row: usize,
}

impl NoteEvent {
    /// Create a new note event
    pub fn new(position: SpatialId, instrument_id: u8, pitch_row: usize) -> Self {
        Self {
            position,
            instrument_id,
            pitch_row,
        }
    }
}

/// Reverse-index payload: the bucket a spatial id lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteRef {
    /// Layer holding the bucket
    pub layer_index: usize,
    /// Tick the bucket is keyed by
    pub time_index: usize,
}

impl NoteRef {
    /// Create a new reverse-index entry
    pub fn new(layer_index: usize, time_index: usize) -> Self {
        Self {
            layer_index,
            time_index,
        }
    }
}

/// Clamp a layer index into `[0, layer_capacity)`
pub fn clamp_layer_index(index: usize, layer_capacity: usize) -> usize {
    index.min(layer_capacity.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_layer_index() {
        assert_eq!(clamp_layer_index(0, 4), 0);
        assert_eq!(clamp_layer_index(3, 4), 3);
        assert_eq!(clamp_layer_index(9, 4), 3);
        assert_eq!(clamp_layer_index(2, 1), 0);
    }

    #[test]
    fn test_spatial_id_display() {
        assert_eq!(SpatialId::new(3, 65, -2).to_string(), "(3, 65, -2)");
    }
}
