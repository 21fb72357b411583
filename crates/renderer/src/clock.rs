//! Frame clock with pause accounting.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const STATS_WINDOW: usize = 60;
const STATS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Paused,
    Stopped,
}

/// Timing handed to the scene for one frame, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Elapsed time since `start`, excluding paused spans.
    pub time: f32,
    /// Time since the previous rendered frame; zero on the first frame after
    /// a start or resume.
    pub delta_time: f32,
}

/// Drives the per-frame callback. `tick` yields a [`FrameTime`] only while
/// running.
#[derive(Debug)]
pub struct FrameDriver {
    state: DriverState,
    origin: Instant,
    last_frame: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,
    stats: Option<FrameStats>,
}

impl FrameDriver {
    /// New driver in the running state with its origin at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            state: DriverState::Running,
            origin: now,
            last_frame: None,
            paused_at: None,
            paused_total: Duration::ZERO,
            stats: None,
        }
    }

    /// Enables the once-per-second frame statistics log.
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.stats = enabled.then(FrameStats::default);
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    /// Restarts the clock at `now`. Has no effect once stopped.
    pub fn start(&mut self, now: Instant) {
        if self.state == DriverState::Stopped {
            return;
        }
        self.state = DriverState::Running;
        self.origin = now;
        self.last_frame = None;
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
    }

    pub fn pause(&mut self, now: Instant) {
        if self.state != DriverState::Running {
            return;
        }
        self.state = DriverState::Paused;
        self.paused_at = Some(now);
        tracing::debug!("frame driver paused");
    }

    pub fn resume(&mut self, now: Instant) {
        if self.state != DriverState::Paused {
            return;
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += now.saturating_duration_since(paused_at);
        }
        self.last_frame = None;
        self.state = DriverState::Running;
        tracing::debug!(paused_total = ?self.paused_total, "frame driver resumed");
    }

    /// Terminal: every later `tick` returns `None`.
    pub fn stop(&mut self) {
        self.state = DriverState::Stopped;
        self.last_frame = None;
        self.paused_at = None;
    }

    /// Advances the clock to `now`.
    pub fn tick(&mut self, now: Instant) -> Option<FrameTime> {
        if self.state != DriverState::Running {
            return None;
        }

        let elapsed = now
            .saturating_duration_since(self.origin)
            .saturating_sub(self.paused_total);
        let delta = self
            .last_frame
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last_frame = Some(now);

        if let Some(stats) = self.stats.as_mut() {
            stats.record(delta, now);
        }

        Some(FrameTime {
            time: elapsed.as_secs_f32(),
            delta_time: delta.as_secs_f32(),
        })
    }
}

/// Rolling frame-time window; logs a summary at most once per second.
#[derive(Debug, Default)]
pub struct FrameStats {
    samples: VecDeque<Duration>,
    last_report: Option<Instant>,
}

impl FrameStats {
    pub fn record(&mut self, delta: Duration, now: Instant) {
        if delta.is_zero() {
            return;
        }
        if self.samples.len() == STATS_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(delta);

        let due = self
            .last_report
            .is_none_or(|last| now.saturating_duration_since(last) >= STATS_INTERVAL);
        if due {
            if let Some((fps, frame_ms)) = self.summary() {
                tracing::info!(
                    fps = format_args!("{fps:.1}"),
                    frame_ms = format_args!("{frame_ms:.2}"),
                    samples = self.samples.len(),
                    "frame stats"
                );
            }
            self.last_report = Some(now);
        }
    }

    /// Mean FPS and mean frame time in milliseconds over the window.
    pub fn summary(&self) -> Option<(f32, f32)> {
        if self.samples.is_empty() {
            return None;
        }
        let total: Duration = self.samples.iter().sum();
        let mean = total.as_secs_f32() / self.samples.len() as f32;
        if mean <= 0.0 {
            return None;
        }
        Some((1.0 / mean, mean * 1000.0))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
