// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note store with a per-layer tick index and a spatial reverse index.
//!
//! The bucket structure owns every [`NoteEvent`]; the reverse index only
//! holds `(layer, tick)` keys that are resolved back into a bucket on demand.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::{clamp_layer_index, NoteEvent, NoteRef, SpatialId, TimeCell};

/// Notes of one layer keyed by tick, each bucket in insertion order
pub type LayerNotes = BTreeMap<usize, Vec<NoteEvent>>;

/// Authoritative note data for one editing session
#[derive(Debug, Clone)]
pub struct NoteStore {
    /// Number of layers the store can hold
    layer_capacity: usize,
    /// Per-layer buckets
    layers: Vec<LayerNotes>,
    /// Spatial id -> bucket location
    refs: HashMap<SpatialId, NoteRef>,
}

impl NoteStore {
    /// Create an empty store with `layer_capacity` layers (at least one)
    pub fn new(layer_capacity: usize) -> Self {
        let layer_capacity = layer_capacity.max(1);
        Self {
            layer_capacity,
            layers: vec![LayerNotes::new(); layer_capacity],
            refs: HashMap::new(),
        }
    }

    /// Get the fixed layer capacity
    pub fn layer_capacity(&self) -> usize {
        self.layer_capacity
    }

    /// Insert a note, replacing whatever was anchored at `pos` before
    pub fn upsert(&mut self, cell: TimeCell, pos: SpatialId, instrument_id: u8, layer_index: usize) {
        let layer_index = clamp_layer_index(layer_index, self.layer_capacity);
        let tick = cell.time_index;

        if let Some(old) = self.refs.insert(pos, NoteRef::new(layer_index, tick)) {
            self.detach(old, pos);
        }

        self.layers[layer_index]
            .entry(tick)
            .or_default()
            .push(NoteEvent::new(pos, instrument_id, cell.pitch_row));
    }

    /// Remove the note anchored at `pos`
    pub fn remove_at(&mut self, pos: SpatialId) -> Option<NoteEvent> {
        let note_ref = self.refs.remove(&pos)?;
        self.detach(note_ref, pos)
    }

    /// Take the note at `pos` out of the bucket `note_ref` points at,
    /// dropping the bucket once it is empty
    fn detach(&mut self, note_ref: NoteRef, pos: SpatialId) -> Option<NoteEvent> {
        let layer = clamp_layer_index(note_ref.layer_index, self.layer_capacity);
        let layer_notes = &mut self.layers[layer];
        let bucket = layer_notes.get_mut(&note_ref.time_index)?;

        let removed = bucket
            .iter()
            .position(|n| n.position == pos)
            .map(|i| bucket.remove(i));

        if bucket.is_empty() {
            layer_notes.remove(&note_ref.time_index);
        }
        removed
    }

    /// Check whether a layer holds no notes
    pub fn is_layer_empty(&self, layer_index: usize) -> bool {
        let layer = clamp_layer_index(layer_index, self.layer_capacity);
        self.layers[layer].values().all(|bucket| bucket.is_empty())
    }

    /// Drop every note at or past `new_length`.
    ///
    /// Reverse-index entries whose projected time (`projection`) is at or
    /// past `new_length` are purged as well, even when no bucket reaches them.
    /// Returns the number of note events removed from buckets.
    pub fn prune_beyond<F>(&mut self, new_length: usize, projection: F) -> usize
    where
        F: Fn(&SpatialId) -> i64,
    {
        let mut removed = 0;

        for layer_notes in &mut self.layers {
            let tail = layer_notes.split_off(&new_length);
            for bucket in tail.into_values() {
                removed += bucket.len();
                for note in bucket {
                    self.refs.remove(&note.position);
                }
            }
        }

        let limit = new_length as i64;
        let before = self.refs.len();
        self.refs.retain(|pos, _| projection(pos) < limit);
        let orphans = before - self.refs.len();
        if orphans > 0 {
            debug!(orphans, new_length, "purged orphaned reverse-index entries");
        }

        removed
    }

    /// Swap the contents of two layers, re-anchoring every moved note.
    ///
    /// `reanchor` maps a note's old position to its position on the new
    /// layer. Returns the number of notes moved.
    pub fn swap_layers<F>(&mut self, a: usize, b: usize, reanchor: F) -> usize
    where
        F: Fn(SpatialId, usize) -> SpatialId,
    {
        let a = clamp_layer_index(a, self.layer_capacity);
        let b = clamp_layer_index(b, self.layer_capacity);
        if a == b {
            return 0;
        }

        let from_a = std::mem::take(&mut self.layers[a]);
        let from_b = std::mem::take(&mut self.layers[b]);
        for note in from_a.values().chain(from_b.values()).flatten() {
            self.refs.remove(&note.position);
        }

        let mut moved = 0;
        for (source, target) in [(from_a, b), (from_b, a)] {
            for (tick, bucket) in source {
                for note in bucket {
                    let pos = reanchor(note.position, target);
                    self.upsert(TimeCell::new(tick, note.pitch_row), pos, note.instrument_id, target);
                    moved += 1;
                }
            }
        }
        moved
    }

    /// Remove every note
    pub fn clear(&mut self) {
        for layer_notes in &mut self.layers {
            layer_notes.clear();
        }
        self.refs.clear();
    }

    /// Get a layer's buckets
    pub fn layer(&self, layer_index: usize) -> Option<&LayerNotes> {
        self.layers.get(layer_index)
    }

    /// Iterate over all layers in index order
    pub fn layers(&self) -> impl Iterator<Item = &LayerNotes> {
        self.layers.iter()
    }

    /// Get the notes due at `tick` on a layer
    pub fn bucket(&self, layer_index: usize, tick: usize) -> Option<&[NoteEvent]> {
        self.layers
            .get(layer_index)?
            .get(&tick)
            .map(|bucket| bucket.as_slice())
    }

    /// Number of tick buckets on a layer
    pub fn bucket_count(&self, layer_index: usize) -> usize {
        self.layers.get(layer_index).map_or(0, |l| l.len())
    }

    /// Look up where the note at `pos` lives
    pub fn note_ref(&self, pos: &SpatialId) -> Option<NoteRef> {
        self.refs.get(pos).copied()
    }

    /// Get the note anchored at `pos`
    pub fn get(&self, pos: &SpatialId) -> Option<&NoteEvent> {
        let note_ref = self.refs.get(pos)?;
        self.layers[note_ref.layer_index]
            .get(&note_ref.time_index)?
            .iter()
            .find(|n| n.position == *pos)
    }

    /// Number of reverse-index entries
    pub fn ref_count(&self) -> usize {
        self.refs.len()
    }

    /// Total number of stored notes
    pub fn len(&self) -> usize {
        self.layers
            .iter()
            .flat_map(|l| l.values())
            .map(|bucket| bucket.len())
            .sum()
    }

    /// Check if the store holds no notes
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|l| l.is_empty())
    }
}

impl Default for NoteStore {
    fn default() -> Self {
        Self::new(4)
    }
}
