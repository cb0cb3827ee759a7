// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback range windows.
//!
//! Begin/end markers are optional and may be given in either order; the
//! window they describe is always normalized low-to-high and clamped into
//! the track.

/// Optional begin/end markers (inclusive step indices)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackRange {
    pub begin: Option<usize>,
    pub end: Option<usize>,
}

/// A normalized `[start, end_exclusive)` window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWindow {
    pub start: usize,
    pub end_exclusive: usize,
}

impl RangeWindow {
    /// Check if the window holds no steps
    pub fn is_empty(&self) -> bool {
        self.start >= self.end_exclusive
    }

    /// Number of steps in the window
    pub fn len(&self) -> usize {
        self.end_exclusive.saturating_sub(self.start)
    }

    /// Check if a step lies inside the window
    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end_exclusive).contains(&index)
    }
}

/// Clamp both bounds, filling a missing begin with 0 and a missing end with
/// the last step
fn clamped_bounds(track_length: usize, begin: Option<usize>, end: Option<usize>) -> (usize, usize) {
    let last = track_length.saturating_sub(1);
    let a = begin.map_or(0, |b| b.min(last));
    let b = end.map_or(last, |e| e.min(last));
    (a, b)
}

/// First step of the playback window
pub fn playback_start_index(track_length: usize, begin: Option<usize>, end: Option<usize>) -> usize {
    if begin.is_none() && end.is_none() {
        return 0;
    }
    let (a, b) = clamped_bounds(track_length, begin, end);
    a.min(b)
}

/// One past the last step of the playback window
pub fn playback_end_exclusive(track_length: usize, begin: Option<usize>, end: Option<usize>) -> usize {
    if begin.is_none() && end.is_none() {
        return track_length;
    }
    let (a, b) = clamped_bounds(track_length, begin, end);
    a.max(b) + 1
}

impl PlaybackRange {
    /// Range with both markers set
    pub fn new(begin: usize, end: usize) -> Self {
        Self {
            begin: Some(begin),
            end: Some(end),
        }
    }

    /// Check if neither marker is set
    pub fn is_unset(&self) -> bool {
        self.begin.is_none() && self.end.is_none()
    }

    /// Normalized window on a track
    pub fn window(&self, track_length: usize) -> RangeWindow {
        RangeWindow {
            start: playback_start_index(track_length, self.begin, self.end),
            end_exclusive: playback_end_exclusive(track_length, self.begin, self.end),
        }
    }

    /// Pull markers back inside a track of `track_length` steps.
    ///
    /// Both markers are dropped when the track has no steps.
    pub fn clamp_to(&mut self, track_length: usize) {
        if track_length == 0 {
            self.begin = None;
            self.end = None;
            return;
        }
        let last = track_length - 1;
        self.begin = self.begin.map(|b| b.min(last));
        self.end = self.end.map(|e| e.min(last));
    }

    /// Drop both markers
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_range_covers_track() {
        let window = PlaybackRange::default().window(100);
        assert_eq!(window, RangeWindow { start: 0, end_exclusive: 100 });
        assert_eq!(window.len(), 100);
    }

    #[test]
    fn test_reversed_bounds_are_normalized() {
        assert_eq!(playback_start_index(100, Some(20), Some(10)), 10);
        assert_eq!(playback_end_exclusive(100, Some(20), Some(10)), 21);
    }

    #[test]
    fn test_single_step_window() {
        let window = PlaybackRange::new(5, 5).window(100);
        assert_eq!(window, RangeWindow { start: 5, end_exclusive: 6 });
        assert!(window.contains(5));
        assert!(!window.contains(6));
    }

    #[test]
    fn test_missing_bound_defaults() {
        let begin_only = PlaybackRange { begin: Some(30), end: None }.window(100);
        assert_eq!(begin_only, RangeWindow { start: 30, end_exclusive: 100 });

        let end_only = PlaybackRange { begin: None, end: Some(30) }.window(100);
        assert_eq!(end_only, RangeWindow { start: 0, end_exclusive: 31 });
    }

    #[test]
    fn test_bounds_clamped_into_track() {
        let window = PlaybackRange::new(150, 400).window(100);
        assert_eq!(window, RangeWindow { start: 99, end_exclusive: 100 });
    }

    #[test]
    fn test_empty_track_window() {
        assert!(PlaybackRange::default().window(0).is_empty());
    }

    #[test]
    fn test_clamp_to() {
        let mut range = PlaybackRange::new(10, 80);
        range.clamp_to(50);
        assert_eq!(range, PlaybackRange::new(10, 49));

        range.clamp_to(0);
        assert!(range.is_unset());
    }
}
