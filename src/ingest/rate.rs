use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Caps how often the bridge pulls a new frame.
#[derive(Clone, Debug)]
pub struct FrameRate {
    interval: Option<Duration>,
    last_frame_at: Option<Instant>,
}

impl FrameRate {
    /// `max_fps <= 0`, non-finite, or too small to express as an interval
    /// disables throttling.
    pub fn from_max_fps(max_fps: f64) -> Self {
        Self {
            interval: frame_interval(max_fps),
            last_frame_at: None,
        }
    }

    pub fn unthrottled() -> Self {
        Self {
            interval: None,
            last_frame_at: None,
        }
    }

    pub(crate) fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Time left before the next frame may start.
    pub fn remaining(&self, now: Instant) -> Duration {
        match (self.interval, self.last_frame_at) {
            (Some(interval), Some(last)) => interval.saturating_sub(now.duration_since(last)),
            _ => Duration::ZERO,
        }
    }

    /// Block until the next frame slot, then claim it.
    ///
    /// Returns false without claiming the slot if `shutdown` is raised while waiting.
    pub fn wait(&mut self, shutdown: &AtomicBool) -> bool {
        loop {
            if shutdown.load(Ordering::SeqCst) {
                return false;
            }
            let remaining = self.remaining(Instant::now());
            if remaining.is_zero() {
                break;
            }
            std::thread::sleep(remaining.min(SHUTDOWN_POLL));
        }
        self.last_frame_at = Some(Instant::now());
        true
    }
}

/// Interval between frames for `max_fps`, if throttling applies.
pub(crate) fn frame_interval(max_fps: f64) -> Option<Duration> {
    if max_fps.is_finite() && max_fps > 0.0 {
        Duration::try_from_secs_f64(1.0 / max_fps).ok()
    } else {
        None
    }
}
