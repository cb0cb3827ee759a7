// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Real-time driver.
//!
//! Feeds host ticks to a shared [`Session`] at a fixed rate until shutdown
//! is signalled or, optionally, until playback stops by itself. The session
//! lock is only held for the duration of one tick.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::StepOutcome;
use crate::session::{Notice, Session};
use crate::timing::{host_tick_interval, HOST_TICKS_PER_SECOND};

/// Driver settings
#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    /// Host tick rate
    pub host_ticks_per_second: u32,
    /// Return as soon as the session is no longer playing
    pub exit_when_stopped: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            host_ticks_per_second: HOST_TICKS_PER_SECOND,
            exit_when_stopped: false,
        }
    }
}

/// What a driver run did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverReport {
    /// Host ticks delivered
    pub host_ticks: u64,
    /// Steps the scheduler ran
    pub steps: u64,
    /// Whether the run ended on a shutdown signal
    pub shut_down: bool,
}

/// Drive `session` until `shutdown` turns true (or its sender is dropped).
///
/// Every notice produced along the way is passed to `on_notice`. On
/// shutdown the session is told its environment is gone, which stops any
/// running playback.
pub async fn run<F>(
    session: Arc<Mutex<Session>>,
    mut shutdown: watch::Receiver<bool>,
    options: DriverOptions,
    mut on_notice: F,
) -> Result<DriverReport>
where
    F: FnMut(&Notice),
{
    let mut ticker = interval(host_tick_interval(options.host_ticks_per_second));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
    let mut report = DriverReport::default();

    info!(rate = options.host_ticks_per_second, "driver started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (outcome, playing) = {
                    let mut guard = session
                        .lock()
                        .map_err(|_| anyhow!("session lock poisoned"))?;
                    let outcome = guard.tick();
                    (outcome, guard.is_playing())
                };

                report.host_ticks += 1;
                if !matches!(outcome, StepOutcome::Idle) {
                    report.steps += 1;
                }
                if let Some(notice) = Notice::from_outcome(outcome) {
                    on_notice(&notice);
                }
                if options.exit_when_stopped && !playing {
                    debug!(host_ticks = report.host_ticks, "session stopped, driver exiting");
                    break;
                }
            }
            changed = shutdown.changed() => {
                if changed.is_ok() && !*shutdown.borrow() {
                    continue;
                }

                let notice = session
                    .lock()
                    .map_err(|_| anyhow!("session lock poisoned"))?
                    .environment_lost();
                if let Some(notice) = notice {
                    on_notice(&notice);
                }
                report.shut_down = true;
                break;
            }
        }
    }

    info!(host_ticks = report.host_ticks, steps = report.steps, "driver stopped");
    Ok(report)
}
