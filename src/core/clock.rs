//! Playback clock and time sources.
//!
//! The clock does not schedule anything itself. It records when the current
//! tick stream started; whoever drives frames (the [`FrameDriver`] thread or
//! a host's own render loop) asks it for the elapsed wall-clock time on each
//! frame. Cadence may vary, so playback math always uses the real delta since
//! `start`, never an assumed frame duration.
//!
//! [`FrameDriver`]: super::driver::FrameDriver

use log::{trace, warn};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of monotonic time for the clock
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Real monotonic time
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicTime;

impl TimeSource for MonotonicTime {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced time for tests and scripted hosts.
///
/// ```ignore
/// let time = Arc::new(ManualTime::new());
/// let clock = PlaybackClock::new(time.clone());
/// time.advance(Duration::from_millis(500));
/// ```
#[derive(Debug)]
pub struct ManualTime {
    now: Mutex<Instant>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move time forward by `delta`
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += delta;
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Default for ManualTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// What a tick handler wants next
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    Stop,
}

/// Cancellable tick stream bookkeeping (one active stream at most)
pub struct PlaybackClock {
    time: Arc<dyn TimeSource>,
    /// Start of the active stream; None when stopped
    started_at: Option<Instant>,
}

impl fmt::Debug for PlaybackClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackClock")
            .field("started_at", &self.started_at)
            .finish()
    }
}

impl PlaybackClock {
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self {
            time,
            started_at: None,
        }
    }

    /// Begin a tick stream at the current time.
    ///
    /// Starting while a stream is active is a caller bug; the controller
    /// guards against it. In release builds the stream is left untouched.
    pub fn start(&mut self) {
        if self.started_at.is_some() {
            debug_assert!(false, "PlaybackClock started twice");
            warn!("PlaybackClock: start() while already running, ignored");
            return;
        }
        self.started_at = Some(self.time.now());
        trace!("PlaybackClock: started");
    }

    /// Stop the stream. Idempotent.
    pub fn stop(&mut self) {
        if self.started_at.take().is_some() {
            trace!("PlaybackClock: stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Milliseconds since `start`, or None when stopped
    pub fn elapsed_ms(&self) -> Option<f64> {
        let started_at = self.started_at?;
        let now = self.time.now();
        Some(now.saturating_duration_since(started_at).as_nanos() as f64 / 1_000_000.0)
    }
}
