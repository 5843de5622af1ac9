//! Thread-safe handle around a bound controller.
//!
//! All three event sources (frame ticks, pointer/manual input, transport
//! calls) go through one mutex, so every event is a single critical section
//! over the scrub state. Callbacks and the view run inside that section and
//! must not call back into the handle.
//!
//! A background driver parks whenever a tick reports `Stop` and is woken by
//! the controller when a new clock stream starts, so a paused or finished
//! controller costs no frames.
//!
//! Dropping the handle detaches the controller: the driver is told to stop,
//! the clock is stopped under the lock, then the driver thread is joined.

use log::error;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::clock::TickFlow;
use super::controller::{BindOptions, PlaybackController};
use super::driver::FrameDriver;
use super::scrub_events::ScrubInput;
use super::scrub_state::{Affordances, PlaybackState, ScrubState};
use super::sequence::{SequenceError, TimeLabel, TimestepSequence};
use super::view::ScrubView;

/// Why `bind` failed
#[derive(Debug)]
pub enum BindError {
    /// Empty, unsorted or duplicated timesteps
    InvalidSequence(SequenceError),
    /// The frame driver thread could not be started
    Driver(std::io::Error),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::InvalidSequence(e) => write!(f, "{}", e),
            BindError::Driver(e) => write!(f, "Failed to start frame driver: {}", e),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BindError::InvalidSequence(e) => Some(e),
            BindError::Driver(e) => Some(e),
        }
    }
}

impl From<SequenceError> for BindError {
    fn from(e: SequenceError) -> Self {
        BindError::InvalidSequence(e)
    }
}

impl From<std::io::Error> for BindError {
    fn from(e: std::io::Error) -> Self {
        BindError::Driver(e)
    }
}

/// Owner of a bound controller and its frame driver
pub struct ControllerHandle<L> {
    inner: Arc<Mutex<PlaybackController<L>>>,
    driver: Option<FrameDriver>,
}

impl<L: TimeLabel> fmt::Debug for ControllerHandle<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerHandle")
            .field("state", &self.state())
            .field("frame_interval", &self.frame_interval())
            .finish()
    }
}

impl<L: TimeLabel> ControllerHandle<L> {
    /// Bind `labels` with no view attached
    pub fn bind<F>(labels: Vec<L>, options: BindOptions, on_position_changed: F) -> Result<Self, BindError>
    where
        F: FnMut(f64) + Send + 'static,
    {
        let frame_interval = options.frame_interval;
        let controller = PlaybackController::bind(labels, options, on_position_changed)?;
        Self::from_controller(controller, frame_interval)
    }

    /// Bind `labels` and draw the handle and buttons into `view`
    pub fn bind_with_view<F>(
        labels: Vec<L>,
        options: BindOptions,
        view: Box<dyn ScrubView>,
        on_position_changed: F,
    ) -> Result<Self, BindError>
    where
        F: FnMut(f64) + Send + 'static,
    {
        let frame_interval = options.frame_interval;
        let controller = PlaybackController::bind(labels, options, on_position_changed)?.with_view(view);
        Self::from_controller(controller, frame_interval)
    }

    /// Wrap a configured controller. `frame_interval` of None (or zero)
    /// leaves ticking to the host via [`tick`](Self::tick).
    pub fn from_controller(
        controller: PlaybackController<L>,
        frame_interval: Option<Duration>,
    ) -> Result<Self, BindError> {
        let inner = Arc::new(Mutex::new(controller));

        let driver = match frame_interval.filter(|d| !d.is_zero()) {
            Some(interval) => {
                let weak = Arc::downgrade(&inner);
                let driver = FrameDriver::spawn("stepscrub-frames", interval, move || match weak.upgrade() {
                    Some(ctrl) => ctrl.lock().unwrap_or_else(|e| e.into_inner()).tick(),
                    None => TickFlow::Stop,
                })?;
                let waker = driver.waker();
                inner
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .set_clock_waker(Box::new(move || waker.wake()));
                Some(driver)
            }
            None => None,
        };

        Ok(Self { inner, driver })
    }

    fn lock(&self) -> MutexGuard<'_, PlaybackController<L>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // === Events ===

    pub fn play(&self) {
        self.lock().play();
    }

    pub fn pause(&self) {
        self.lock().pause();
    }

    pub fn restart(&self) {
        self.lock().restart();
    }

    pub fn toggle_play(&self) {
        self.lock().toggle_play();
    }

    pub fn pointer_down(&self) {
        self.lock().pointer_down();
    }

    pub fn pointer_up(&self) {
        self.lock().pointer_up();
    }

    pub fn manual_input(&self, raw: f64) {
        self.lock().manual_input(raw);
    }

    /// Dispatch one input event
    pub fn send(&self, input: ScrubInput) {
        self.lock().handle_input(input);
    }

    /// Advance one frame; for hosts that drive frames themselves.
    pub fn tick(&self) -> TickFlow {
        self.lock().tick()
    }

    /// Swap the bound sequence (resets position to the new final step)
    pub fn replace_sequence(&self, labels: Vec<L>) -> Result<(), SequenceError> {
        self.lock().replace_sequence(labels)
    }

    // === Derived state ===

    pub fn state(&self) -> ScrubState {
        self.lock().state()
    }

    pub fn position(&self) -> f64 {
        self.lock().position()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.lock().playback_state()
    }

    pub fn affordances(&self) -> Affordances {
        self.lock().affordances()
    }

    pub fn current_label(&self) -> L {
        self.lock().current_label().clone()
    }

    pub fn sequence(&self) -> Arc<TimestepSequence<L>> {
        Arc::clone(self.lock().sequence())
    }

    /// True when a background driver ticks this controller
    pub fn is_driven(&self) -> bool {
        self.driver.is_some()
    }

    /// Cadence of the background driver, if any
    pub fn frame_interval(&self) -> Option<Duration> {
        self.driver.as_ref().map(FrameDriver::interval)
    }

    /// True when the background driver is parked waiting for playback
    pub fn is_idle(&self) -> bool {
        self.driver.as_ref().is_some_and(FrameDriver::is_parked)
    }

    /// Detach explicitly (same as dropping the handle)
    pub fn detach(self) {
        drop(self);
    }
}

impl<L> Drop for ControllerHandle<L> {
    fn drop(&mut self) {
        // Stop the clock under the lock first, then join without holding it.
        match self.inner.lock() {
            Ok(mut ctrl) => ctrl.detach(),
            Err(poisoned) => {
                error!("PlaybackController mutex poisoned during detach");
                poisoned.into_inner().detach();
            }
        }
        if let Some(mut driver) = self.driver.take() {
            driver.shutdown();
        }
    }
}
