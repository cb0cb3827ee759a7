// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! User-facing results of session operations.

use std::fmt;

use thiserror::Error;

use crate::playback::StepOutcome;

/// Why a settings change was refused; the session state is unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Max track length is {0}")]
    MaxTrackLength(usize),
    #[error("Min track length is {0}")]
    MinTrackLength(usize),
    #[error("Max layers reached ({0})")]
    MaxLayers(usize),
    #[error("Layer isn't empty.")]
    LayerNotEmpty,
    #[error("Can't remove the last layer.")]
    LastLayer,
    #[error("Layer {} doesn't exist.", .0 + 1)]
    NoSuchLayer(usize),
}

/// Status message for the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    PlaybackStarted,
    PlaybackStopped,
    PlaybackFinished,
    InvalidRange,
    TempoSet(u32),
    LoopSet(bool),
    TrackLengthSet(usize),
    /// Layer count changed
    Layers { count: usize, active: usize },
    /// Active layer changed
    ActiveLayer { index: usize, count: usize },
    RangeBegin(usize),
    RangeEnd(usize),
    RangeCleared,
    SongLoaded { notes: usize, skipped: usize },
}

impl Notice {
    /// Notice for a scheduler outcome, if it is worth telling the player
    pub fn from_outcome(outcome: StepOutcome) -> Option<Self> {
        match outcome {
            StepOutcome::InvalidRange => Some(Notice::InvalidRange),
            StepOutcome::Finished { .. } => Some(Notice::PlaybackFinished),
            StepOutcome::Idle | StepOutcome::Stepped { .. } | StepOutcome::Looped { .. } => None,
        }
    }

    /// Check if this notice reports a problem
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::InvalidRange)
    }

    /// Check if playback is over after this notice
    pub fn ends_playback(&self) -> bool {
        matches!(
            self,
            Notice::PlaybackStopped | Notice::PlaybackFinished | Notice::InvalidRange
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::PlaybackStarted => write!(f, "Playback started."),
            Notice::PlaybackStopped => write!(f, "Playback stopped."),
            Notice::PlaybackFinished => write!(f, "Playback finished."),
            Notice::InvalidRange => write!(f, "Invalid range."),
            Notice::TempoSet(ticks) => write!(f, "Tempo set to {} ticks/step", ticks),
            Notice::LoopSet(true) => write!(f, "Loop enabled"),
            Notice::LoopSet(false) => write!(f, "Loop disabled"),
            Notice::TrackLengthSet(length) => write!(f, "Track length set to {}", length),
            Notice::Layers { count, active } => write!(f, "Layers: {} (active {})", count, active + 1),
            Notice::ActiveLayer { index, count } => write!(f, "Layer: {}/{}", index + 1, count),
            Notice::RangeBegin(index) => write!(f, "Begin: {}", index),
            Notice::RangeEnd(index) => write!(f, "End: {}", index),
            Notice::RangeCleared => write!(f, "Range cleared"),
            Notice::SongLoaded { notes, skipped: 0 } => write!(f, "Loaded song ({} notes).", notes),
            Notice::SongLoaded { notes, skipped } => {
                write!(f, "Loaded song ({} notes, {} skipped).", notes, skipped)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(Rejection::MaxTrackLength(1000).to_string(), "Max track length is 1000");
        assert_eq!(Rejection::MaxLayers(4).to_string(), "Max layers reached (4)");
        assert_eq!(Rejection::LayerNotEmpty.to_string(), "Layer isn't empty.");
        assert_eq!(Rejection::LastLayer.to_string(), "Can't remove the last layer.");
        assert_eq!(Rejection::NoSuchLayer(2).to_string(), "Layer 3 doesn't exist.");
    }

    #[test]
    fn test_notice_messages() {
        assert_eq!(Notice::Layers { count: 2, active: 0 }.to_string(), "Layers: 2 (active 1)");
        assert_eq!(Notice::ActiveLayer { index: 1, count: 3 }.to_string(), "Layer: 2/3");
        assert_eq!(Notice::TempoSet(4).to_string(), "Tempo set to 4 ticks/step");
        assert_eq!(Notice::SongLoaded { notes: 3, skipped: 0 }.to_string(), "Loaded song (3 notes).");
    }

    #[test]
    fn test_from_outcome() {
        assert_eq!(Notice::from_outcome(StepOutcome::Idle), None);
        assert_eq!(Notice::from_outcome(StepOutcome::Looped { tick: 9 }), None);
        assert_eq!(Notice::from_outcome(StepOutcome::Finished { tick: 9 }), Some(Notice::PlaybackFinished));
        assert_eq!(Notice::from_outcome(StepOutcome::InvalidRange), Some(Notice::InvalidRange));
        assert!(Notice::InvalidRange.is_error());
        assert!(Notice::InvalidRange.ends_playback());
        assert!(!Notice::PlaybackStarted.ends_playback());
    }
}
