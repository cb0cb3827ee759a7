// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! File watcher for hot-reloading a song.
//!
//! Watches one song file and emits a debounced [`SongEvent`] whenever it is
//! modified, so an edited file can be re-applied without restarting.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::warn;

use super::SongPayload;

/// Events emitted by the song watcher
#[derive(Debug, Clone)]
pub enum SongEvent {
    /// The song file changed and parsed successfully
    Reloaded(Box<SongPayload>),
    /// The song file changed but failed to parse
    Error(String),
}

/// Song file watcher with debouncing
pub struct SongWatcher {
    _watcher: RecommendedWatcher,
    event_receiver: Receiver<SongEvent>,
    watched_path: PathBuf,
}

impl SongWatcher {
    /// Watch a song file.
    ///
    /// # Arguments
    /// * `path` - Song file to watch
    /// * `debounce_ms` - Debounce duration in milliseconds (default: 300)
    pub fn new<P: AsRef<Path>>(path: P, debounce_ms: Option<u64>) -> Result<Self> {
        let watched_path = path.as_ref().to_path_buf();
        let debounce_duration = Duration::from_millis(debounce_ms.unwrap_or(300));

        let (event_tx, event_rx): (Sender<SongEvent>, Receiver<SongEvent>) = mpsc::channel();
        let (notify_tx, notify_rx): (Sender<Event>, Receiver<Event>) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    let _ = notify_tx.send(event);
                }
                Err(e) => warn!("song watcher error: {}", e),
            },
            Config::default(),
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {}", e))?;

        watcher
            .watch(&watched_path, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow!("Failed to watch path {:?}: {}", watched_path, e))?;

        let song_path = watched_path.clone();
        std::thread::spawn(move || {
            let mut last_event_time: Option<Instant> = None;

            loop {
                match notify_rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(event) => {
                        if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                            last_event_time = Some(Instant::now());
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let Some(last_time) = last_event_time else {
                            continue;
                        };
                        if last_time.elapsed() < debounce_duration {
                            continue;
                        }
                        last_event_time = None;

                        let event = match SongPayload::load(&song_path) {
                            Ok(payload) => SongEvent::Reloaded(Box::new(payload)),
                            Err(e) => SongEvent::Error(format!("Failed to load {:?}: {:#}", song_path, e)),
                        };
                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            event_receiver: event_rx,
            watched_path,
        })
    }

    /// Try to receive the next song event (non-blocking)
    pub fn try_recv(&self) -> Option<SongEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Receive all pending song events
    pub fn recv_all(&self) -> Vec<SongEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Wait up to `timeout` for the next song event
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SongEvent> {
        self.event_receiver.recv_timeout(timeout).ok()
    }

    /// Get the path being watched
    pub fn watched_path(&self) -> &Path {
        &self.watched_path
    }
}

/// Parse a song file without applying it
pub fn validate_song<P: AsRef<Path>>(path: P) -> Result<SongPayload> {
    SongPayload::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_validate_song() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("song.json");
        fs::write(&file_path, r#"{"schemaVersion":1,"trackLength":32,"ticksPerStep":3,"layerCount":1,"layers":[[]]}"#).unwrap();

        let payload = validate_song(&file_path).unwrap();
        assert_eq!(payload.track_length, 32);
        assert_eq!(payload.ticks_per_step, 3);
    }

    #[test]
    fn test_validate_invalid_song() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("broken.json");
        fs::write(&file_path, "{ not json").unwrap();
        assert!(validate_song(&file_path).is_err());
    }

    #[test]
    fn test_watcher_creation() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("watch.json");
        fs::write(&file_path, "{}").unwrap();

        let watcher = SongWatcher::new(&file_path, Some(100)).unwrap();
        assert_eq!(watcher.watched_path(), file_path.as_path());
        assert!(watcher.recv_all().is_empty());
    }

    #[test]
    fn test_watcher_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(SongWatcher::new(dir.path().join("nope.json"), None).is_err());
    }

    #[test]
    fn test_watcher_detects_changes() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("detect.json");
        fs::write(&file_path, r#"{"trackLength": 10}"#).unwrap();

        let watcher = SongWatcher::new(&file_path, Some(100)).unwrap();
        std::thread::sleep(Duration::from_millis(50));

        let mut file = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&file_path)
            .unwrap();
        file.write_all(br#"{"trackLength": 77}"#).unwrap();
        file.flush().unwrap();
        drop(file);

        // The event may not fire in every CI environment, so only check its content.
        if let Some(SongEvent::Reloaded(payload)) = watcher.recv_timeout(Duration::from_millis(600)) {
            assert_eq!(payload.track_length, 77);
        }
    }
}
