//! Fixed-interval tick driver
//!
//! Plays the role of a display-refresh callback: ticks run back to back on
//! the calling thread, each followed by a sleep for whatever is left of the
//! interval. A tick is never started while another is running, and the
//! driver checks the loop's state before every tick so a queued `Stop` ends
//! the run promptly.

use super::{ScanLoop, TickOutcome};
use crate::config::ScanConfig;
use crate::source::{CameraSource, DisplaySurface, SymbolDecoder};
use std::thread;
use std::time::{Duration, Instant};

/// Drives [`ScanLoop::tick`] at a fixed cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameScheduler {
    interval: Duration,
}

impl FrameScheduler {
    /// Scheduler ticking every `interval`; zero ticks as fast as possible
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Scheduler ticking every `config.frame_interval`
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.frame_interval)
    }

    /// Tick interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run at most `max_ticks` ticks, stopping early once the loop leaves
    /// streaming. `on_tick` sees every outcome. Returns the ticks run.
    pub fn run<C, D, S, F>(
        &self,
        scan: &mut ScanLoop<C, D, S>,
        max_ticks: Option<u64>,
        mut on_tick: F,
    ) -> u64
    where
        C: CameraSource,
        D: SymbolDecoder,
        S: DisplaySurface,
        F: FnMut(&TickOutcome),
    {
        let mut ticks = 0u64;
        while max_ticks.is_none_or(|max| ticks < max) {
            let started = Instant::now();
            let outcome = scan.tick();
            if outcome == TickOutcome::Idle {
                break;
            }
            ticks += 1;
            on_tick(&outcome);

            if let Some(rest) = self.interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        log::debug!("scheduler ran {ticks} ticks");
        ticks
    }

    /// Run exactly `count` ticks unless the loop stops first
    pub fn run_ticks<C, D, S>(&self, scan: &mut ScanLoop<C, D, S>, count: u64) -> Vec<TickOutcome>
    where
        C: CameraSource,
        D: SymbolDecoder,
        S: DisplaySurface,
    {
        let mut outcomes = Vec::with_capacity(count as usize);
        self.run(scan, Some(count), |outcome| outcomes.push(outcome.clone()));
        outcomes
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}
