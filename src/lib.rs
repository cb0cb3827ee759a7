// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! GRIDSEQ - grid-based multi-layer step sequencer engine.
//!
//! The crate is organised leaf-first:
//! - [`score`]: the note store, indexed per layer/tick and by spatial id
//! - [`editor`]: world-cell mapping, note edits and the pitch mapping
//! - [`timing`]: the discrete host-tick step clock
//! - [`playback`]: the playback scheduler, range windows and the real-time driver
//! - [`session`]: orchestration rules tying settings, store and scheduler together
//! - [`persistence`]: song payload mapping and hot reload
//! - [`sink`]: collaborator interfaces for rendering and audio feedback

pub mod config;
pub mod editor;
pub mod persistence;
pub mod playback;
pub mod score;
pub mod session;
pub mod sink;
pub mod timing;

pub use config::EngineConfig;
pub use editor::{Editor, Instrument, TrackGeometry};
pub use persistence::{NoteDto, SongPayload};
pub use playback::{PlaybackRange, PlaybackScheduler, RangeWindow, StepOutcome};
pub use score::{NoteEvent, NoteRef, NoteStore, SpatialId, TimeCell};
pub use session::{Notice, Rejection, Session};
pub use sink::{FeedbackSink, RenderSink};
