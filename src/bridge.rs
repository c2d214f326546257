//! Frame callback and run loop.
//!
//! Every frame ends in exactly one absolute command: ON if any detection
//! survived filtering, OFF otherwise. Notification failures are logged and
//! dropped; the next frame re-sends the current state anyway.

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::detect::{DetectionFilter, Prediction};
use crate::ingest::{FrameRate, PredictionSource, SourceError};
use crate::transport::{SensorNotifier, SensorState};

const STATS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Why the run loop returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The shutdown flag was raised.
    Interrupted,
    /// The source reported no more frames.
    SourceExhausted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub frames_handled: u64,
    pub frames_skipped: u64,
    pub on_commands: u64,
    pub off_commands: u64,
    pub notify_failures: u64,
}

pub struct PackageBridge<N> {
    filter: DetectionFilter,
    notifier: N,
    stats: BridgeStats,
}

impl<N: SensorNotifier> PackageBridge<N> {
    pub fn new(filter: DetectionFilter, notifier: N) -> Self {
        Self {
            filter,
            notifier,
            stats: BridgeStats::default(),
        }
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Handle one frame: filter, count, and push the resulting state.
    pub fn handle_prediction(&mut self, prediction: &Prediction) -> SensorState {
        let retained = self.filter.retained(prediction);
        let count = retained.len();
        log::info!("{}", found_message(count));
        if count > 0 {
            let summary: Vec<String> = retained
                .iter()
                .map(|d| format!("conf={:.2} bbox={}", d.confidence, d.bbox))
                .collect();
            log::debug!("Valid detections: {}", summary.join("; "));
        }

        let state = SensorState::from_count(count);
        self.stats.frames_handled += 1;
        match state {
            SensorState::On => self.stats.on_commands += 1,
            SensorState::Off => self.stats.off_commands += 1,
        }
        self.notify(state);
        state
    }

    fn notify(&mut self, state: SensorState) {
        if let Err(e) = self.notifier.set(state) {
            self.stats.notify_failures += 1;
            log::error!("Failed to turn {} sensor: {:#}", state, e);
        }
    }

    /// Pull frames from `source` until it is exhausted or `shutdown` is raised.
    ///
    /// Frame errors skip the frame without a command; fatal source errors end the loop.
    pub fn run<S>(
        &mut self,
        source: &mut S,
        rate: &mut FrameRate,
        shutdown: &AtomicBool,
    ) -> Result<RunOutcome>
    where
        S: PredictionSource + ?Sized,
    {
        log::info!(
            "{} source running, notifying {}",
            source.name(),
            self.notifier.target()
        );
        let mut last_stats_log = Instant::now();

        let outcome = loop {
            if !rate.wait(shutdown) {
                break RunOutcome::Interrupted;
            }

            match source.next_prediction() {
                Ok(Some(prediction)) => {
                    self.handle_prediction(&prediction);
                }
                Ok(None) => break RunOutcome::SourceExhausted,
                Err(SourceError::Frame(e)) => {
                    self.stats.frames_skipped += 1;
                    log::warn!("Skipping frame: {:#}", e);
                }
                Err(SourceError::Fatal(e)) => {
                    self.log_stats();
                    return Err(anyhow!("{} source failed: {:#}", source.name(), e));
                }
            }

            if shutdown.load(Ordering::SeqCst) {
                break RunOutcome::Interrupted;
            }

            if last_stats_log.elapsed() >= STATS_LOG_INTERVAL {
                log::debug!("bridge stats: {:?}", self.stats);
                last_stats_log = Instant::now();
            }
        };

        self.log_stats();
        Ok(outcome)
    }

    fn log_stats(&self) {
        log::info!(
            "frames={} skipped={} on={} off={} notify_failures={}",
            self.stats.frames_handled,
            self.stats.frames_skipped,
            self.stats.on_commands,
            self.stats.off_commands,
            self.stats.notify_failures
        );
    }
}

fn found_message(count: usize) -> String {
    format!("Found {} package{}", count, if count > 1 { "s" } else { "" })
}
