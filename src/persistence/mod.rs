// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song payload mapping.
//!
//! A [`SongPayload`] is a pure snapshot of a session: track settings plus
//! each layer's notes as `{t, i, p}` triples. It is produced from the
//! store's read view and applied back by a bulk load that silently skips
//! anything outside the current bounds. JSON is the native encoding; YAML
//! is accepted for hand-written songs.

pub mod watcher;

pub use watcher::{validate_song, SongEvent, SongWatcher};

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::editor::{Editor, INSTRUMENT_COUNT};
use crate::score::{NoteStore, TimeCell};

/// Current payload schema
pub const SCHEMA_VERSION: u32 = 1;

/// One stored note: tick, instrument id, pitch row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteDto {
    pub t: i64,
    pub i: i64,
    pub p: i64,
}

/// Serialized song
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SongPayload {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default = "default_track_length")]
    pub track_length: i64,
    #[serde(default = "default_ticks_per_step")]
    pub ticks_per_step: i64,
    #[serde(default = "default_layer_count")]
    pub layer_count: i64,
    /// Notes per layer; `null` layers and notes read as absent
    #[serde(default, deserialize_with = "lenient_layers")]
    pub layers: Vec<Vec<NoteDto>>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}
fn default_track_length() -> i64 {
    100
}
fn default_ticks_per_step() -> i64 {
    2
}
fn default_layer_count() -> i64 {
    1
}

fn lenient_layers<'de, D>(deserializer: D) -> std::result::Result<Vec<Vec<NoteDto>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<Vec<Option<NoteDto>>>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|layer| layer.unwrap_or_default().into_iter().flatten().collect())
        .collect())
}

impl Default for SongPayload {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            track_length: default_track_length(),
            ticks_per_step: default_ticks_per_step(),
            layer_count: default_layer_count(),
            layers: Vec::new(),
        }
    }
}

/// Result of a bulk load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadStats {
    /// Notes written to the store
    pub loaded: usize,
    /// Entries dropped for being out of bounds
    pub skipped: usize,
}

impl SongPayload {
    /// Snapshot the first `layer_count` layers of a store
    pub fn from_store(store: &NoteStore, track_length: usize, ticks_per_step: u32, layer_count: usize) -> Self {
        let layers = store
            .layers()
            .take(layer_count)
            .map(|layer| {
                layer
                    .iter()
                    .flat_map(|(tick, bucket)| {
                        bucket.iter().map(move |n| NoteDto {
                            t: *tick as i64,
                            i: n.instrument_id as i64,
                            p: n.pitch_row as i64,
                        })
                    })
                    .collect()
            })
            .collect();

        Self {
            schema_version: SCHEMA_VERSION,
            track_length: track_length as i64,
            ticks_per_step: ticks_per_step as i64,
            layer_count: layer_count as i64,
            layers,
        }
    }

    /// Total number of note entries
    pub fn note_count(&self) -> usize {
        self.layers.iter().map(|l| l.len()).sum()
    }

    /// Clear `store` and fill it from this payload.
    ///
    /// Only the first `layer_count` layers are read. Entries whose tick lies
    /// outside `[0, track_length)` or whose pitch row lies outside the track
    /// are skipped. Unknown instrument ids fall back to the first palette
    /// instrument.
    pub fn apply_to(&self, store: &mut NoteStore, editor: &Editor, track_length: usize, layer_count: usize) -> LoadStats {
        store.clear();

        let pitch_width = editor.geometry().pitch_width as i64;
        let mut stats = LoadStats::default();

        for (layer, notes) in self.layers.iter().enumerate().take(layer_count) {
            for note in notes {
                if note.t < 0 || note.t >= track_length as i64 || note.p < 0 || note.p >= pitch_width {
                    stats.skipped += 1;
                    continue;
                }

                let instrument_id = u8::try_from(note.i)
                    .ok()
                    .filter(|id| *id < INSTRUMENT_COUNT)
                    .unwrap_or(0);
                let cell = TimeCell::new(note.t as usize, note.p as usize);
                store.upsert(cell, editor.world_position(cell, layer), instrument_id, layer);
                stats.loaded += 1;
            }
        }

        if stats.skipped > 0 {
            debug!(skipped = stats.skipped, "discarded out-of-bounds song entries");
        }
        stats
    }

    /// Parse a payload from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse song JSON")
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize song to JSON")
    }

    /// Parse a payload from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse song YAML")
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize song to YAML")
    }

    /// Load a song file; `.yaml`/`.yml` files are read as YAML, anything else as JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read song file: {:?}", path))?;
        if is_yaml(path) {
            Self::from_yaml(&contents)
        } else {
            Self::from_json(&contents)
        }
    }

    /// Save a song file, picking the format from the extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = if is_yaml(path) { self.to_yaml()? } else { self.to_json()? };
        fs::write(path, text).with_context(|| format!("Failed to write song file: {:?}", path))
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::SpatialId;

    fn editor() -> Editor {
        Editor::default()
    }

    #[test]
    fn test_from_store_orders_by_tick() {
        let editor = editor();
        let mut store = NoteStore::new(4);
        for (tick, pitch, instrument, layer) in [(9usize, 1usize, 3u8, 0usize), (2, 4, 5, 0), (7, 0, 1, 1)] {
            let cell = TimeCell::new(tick, pitch);
            store.upsert(cell, editor.world_position(cell, layer), instrument, layer);
        }

        let payload = SongPayload::from_store(&store, 100, 2, 2);
        assert_eq!(payload.layers.len(), 2);
        assert_eq!(payload.layers[0], vec![NoteDto { t: 2, i: 5, p: 4 }, NoteDto { t: 9, i: 3, p: 1 }]);
        assert_eq!(payload.layers[1], vec![NoteDto { t: 7, i: 1, p: 0 }]);
        assert_eq!(payload.note_count(), 3);
    }

    #[test]
    fn test_json_field_names() {
        let payload = SongPayload {
            layers: vec![vec![NoteDto { t: 1, i: 2, p: 3 }]],
            ..SongPayload::default()
        };
        let json = payload.to_json().unwrap();
        assert!(json.contains("\"schemaVersion\":1"));
        assert!(json.contains("\"trackLength\":100"));
        assert!(json.contains("\"ticksPerStep\":2"));
        assert!(json.contains("\"layerCount\":1"));
        assert!(json.contains("{\"t\":1,\"i\":2,\"p\":3}"));
    }

    #[test]
    fn test_lenient_nulls_and_missing_fields() {
        let json = r#"{"trackLength": 50, "layers": [null, [null, {"t": 4, "i": 1, "p": 2}]]}"#;
        let payload = SongPayload::from_json(json).unwrap();
        assert_eq!(payload.schema_version, SCHEMA_VERSION);
        assert_eq!(payload.ticks_per_step, 2);
        assert_eq!(payload.layers, vec![vec![], vec![NoteDto { t: 4, i: 1, p: 2 }]]);

        let empty = SongPayload::from_json(r#"{"layers": null}"#).unwrap();
        assert!(empty.layers.is_empty());
    }

    #[test]
    fn test_apply_skips_out_of_bounds() {
        let editor = editor();
        let mut store = NoteStore::new(4);
        let payload = SongPayload {
            layers: vec![vec![
                NoteDto { t: 0, i: 1, p: 0 },
                NoteDto { t: -1, i: 1, p: 0 },
                NoteDto { t: 50, i: 1, p: 0 },
                NoteDto { t: 3, i: 1, p: 25 },
                NoteDto { t: 3, i: 1, p: -4 },
                NoteDto { t: 49, i: 2, p: 24 },
            ]],
            ..SongPayload::default()
        };

        let stats = payload.apply_to(&mut store, &editor, 50, 1);
        assert_eq!(stats, LoadStats { loaded: 2, skipped: 4 });
        assert_eq!(store.len(), 2);
        assert!(store.get(&SpatialId::new(49, 65, 24)).is_some());
    }

    #[test]
    fn test_apply_reads_only_active_layers() {
        let editor = editor();
        let mut store = NoteStore::new(4);
        let payload = SongPayload {
            layer_count: 1,
            layers: vec![vec![NoteDto { t: 1, i: 1, p: 1 }], vec![NoteDto { t: 2, i: 2, p: 2 }]],
            ..SongPayload::default()
        };

        let stats = payload.apply_to(&mut store, &editor, 100, 1);
        assert_eq!(stats.loaded, 1);
        assert!(store.is_layer_empty(1));
    }

    #[test]
    fn test_apply_normalizes_unknown_instrument() {
        let editor = editor();
        let mut store = NoteStore::new(4);
        let payload = SongPayload {
            layers: vec![vec![NoteDto { t: 1, i: 99, p: 1 }, NoteDto { t: 2, i: -3, p: 1 }]],
            ..SongPayload::default()
        };
        payload.apply_to(&mut store, &editor, 100, 1);
        assert!(store.layers().flat_map(|l| l.values()).flatten().all(|n| n.instrument_id == 0));
    }

    #[test]
    fn test_apply_clears_previous_notes() {
        let editor = editor();
        let mut store = NoteStore::new(4);
        let cell = TimeCell::new(5, 5);
        store.upsert(cell, editor.world_position(cell, 0), 1, 0);

        SongPayload::default().apply_to(&mut store, &editor, 100, 1);
        assert!(store.is_empty());
        assert_eq!(store.ref_count(), 0);
    }

    #[test]
    fn test_save_and_load_files() {
        let dir = tempfile::tempdir().unwrap();
        let payload = SongPayload {
            track_length: 64,
            ticks_per_step: 4,
            layer_count: 2,
            layers: vec![vec![NoteDto { t: 3, i: 7, p: 12 }], vec![]],
            ..SongPayload::default()
        };

        let json_path = dir.path().join("song.json");
        payload.save(&json_path).unwrap();
        assert_eq!(SongPayload::load(&json_path).unwrap(), payload);

        let yaml_path = dir.path().join("song.yaml");
        payload.save(&yaml_path).unwrap();
        assert_eq!(SongPayload::load(&yaml_path).unwrap(), payload);

        assert!(SongPayload::load(dir.path().join("missing.json")).is_err());
    }
}
