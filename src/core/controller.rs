//! Playback controller: continuous scrub position over a timestep sequence.
//!
//! **Architecture**: the controller owns the scrub state and the clock. It
//! does NOT own visualization caches; those live in `RenderGate`s on the
//! visualization side and only see the positions this controller emits.
//!
//! # Timing Model
//!
//! Wall-clock based: while playing, `position = start + elapsed / ms_per_step`
//! where `start` is the position the current clock stream began at. Frames
//! may arrive at any cadence; a slow frame simply lands further ahead.
//! The position is clamped to the final step and playback stops there.
//!
//! # Events
//!
//! Every handler below is one transition and runs to completion before the
//! next event is processed. Thread-safe access goes through
//! [`ControllerHandle`](super::handle::ControllerHandle), which serializes
//! all events on one mutex.
//!
//! | Event            | Effect                                              |
//! |------------------|-----------------------------------------------------|
//! | `play`           | start clock from current position (end: no-op)      |
//! | `pause`          | clear running, stop clock                           |
//! | `restart`        | rewind to 0, then `play`                            |
//! | `pointer_down`   | capture; stop clock, keep running                   |
//! | `pointer_up`     | release; resume from current position if running    |
//! | `manual_input`   | clamp and set position; at the end stop running     |
//! | `tick`           | advance by elapsed time                             |

use log::{debug, info, trace};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::clock::{MonotonicTime, PlaybackClock, TickFlow, TimeSource};
use super::scrub_events::ScrubInput;
use super::scrub_state::{Affordances, PlaybackState, ScrubState};
use super::sequence::{SequenceError, TimeLabel, TimestepSequence};
use super::view::{HandleFrame, NullView, ScrubView, DEFAULT_LABEL_PREFIX};

/// Default playback speed: wall-clock milliseconds per step
pub const DEFAULT_MS_PER_STEP: u32 = 200;

/// Default cadence of the background frame driver (~60Hz)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Downstream position-changed hook
pub type PositionCallback = Box<dyn FnMut(f64) + Send>;

/// Called whenever a new clock stream starts
pub type ClockWaker = Box<dyn Fn() + Send>;

/// Options accepted by `bind`
#[derive(Clone, Debug, PartialEq)]
pub struct BindOptions {
    /// Starting position; None starts on the final step
    pub initial_position: Option<f64>,
    /// Milliseconds of wall-clock time per unit of position
    pub ms_per_step: u32,
    /// Text in front of the step label
    pub label_prefix: String,
    /// Frame driver cadence; None when the host calls `tick` itself
    pub frame_interval: Option<Duration>,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            initial_position: None,
            ms_per_step: DEFAULT_MS_PER_STEP,
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
            frame_interval: Some(DEFAULT_FRAME_INTERVAL),
        }
    }
}

/// Scrub/playback state machine bound to one timestep sequence
pub struct PlaybackController<L> {
    sequence: Arc<TimestepSequence<L>>,
    state: ScrubState,
    clock: PlaybackClock,
    /// Position the active clock stream started from
    start_position: f64,
    ms_per_step: f64,
    label_prefix: String,
    on_position_changed: PositionCallback,
    view: Box<dyn ScrubView>,
    clock_waker: Option<ClockWaker>,
    detached: bool,
}

impl<L: TimeLabel> fmt::Debug for PlaybackController<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("steps", &self.sequence.len())
            .field("state", &self.state)
            .field("clock", &self.clock)
            .field("ms_per_step", &self.ms_per_step)
            .finish()
    }
}

impl<L: TimeLabel> PlaybackController<L> {
    /// Validate `labels` and attach a controller to them.
    ///
    /// Fails with an invalid-sequence error when labels are empty, unsorted
    /// or duplicated; no controller exists in that case.
    pub fn bind<F>(labels: Vec<L>, options: BindOptions, on_position_changed: F) -> Result<Self, SequenceError>
    where
        F: FnMut(f64) + Send + 'static,
    {
        let sequence = Arc::new(TimestepSequence::new(labels)?);
        Ok(Self::bind_sequence(sequence, options, on_position_changed))
    }

    /// Attach to an already validated sequence
    pub fn bind_sequence<F>(sequence: Arc<TimestepSequence<L>>, options: BindOptions, on_position_changed: F) -> Self
    where
        F: FnMut(f64) + Send + 'static,
    {
        let position = match options.initial_position {
            Some(p) => sequence.clamp_position(p),
            None => sequence.max_position(),
        };
        info!(
            "PlaybackController bound: {} steps, start {:.3}, {}ms/step",
            sequence.len(),
            position,
            options.ms_per_step
        );

        Self {
            sequence,
            state: ScrubState::new(position),
            clock: PlaybackClock::new(Arc::new(MonotonicTime)),
            start_position: position,
            // Zero would divide by zero; treat as the fastest sane speed.
            ms_per_step: options.ms_per_step.max(1) as f64,
            label_prefix: options.label_prefix,
            on_position_changed: Box::new(on_position_changed),
            view: Box::new(NullView),
            clock_waker: None,
            detached: false,
        }
    }

    /// Attach a view and draw the current state into it.
    pub fn with_view(mut self, view: Box<dyn ScrubView>) -> Self {
        self.view = view;
        self.render_handle();
        self.sync_affordances();
        self
    }

    /// Replace the time source (tests, scripted hosts). Must be called before playback.
    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.clock = PlaybackClock::new(time);
        self
    }

    /// Install the hook that resumes a parked frame driver
    pub fn set_clock_waker(&mut self, waker: ClockWaker) {
        self.clock_waker = Some(waker);
    }

    // === Accessors ===

    pub fn sequence(&self) -> &Arc<TimestepSequence<L>> {
        &self.sequence
    }

    /// Snapshot of the scrub state
    pub fn state(&self) -> ScrubState {
        self.state
    }

    pub fn position(&self) -> f64 {
        self.state.position
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_pointer_captured(&self) -> bool {
        self.state.pointer_captured
    }

    /// True while a tick stream is active
    pub fn is_clock_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.state.playback_state(self.sequence.max_position())
    }

    pub fn affordances(&self) -> Affordances {
        self.playback_state().affordances()
    }

    /// Label under the handle
    pub fn current_label(&self) -> &L {
        self.sequence.label_at(self.state.position)
    }

    pub fn ms_per_step(&self) -> f64 {
        self.ms_per_step
    }

    pub fn label_prefix(&self) -> &str {
        &self.label_prefix
    }

    // === Transport ===

    /// Start playback from the current position.
    ///
    /// At the final step this only normalizes the buttons. While the pointer
    /// is captured the clock is held back until release. Calling it while
    /// already playing does nothing.
    pub fn play(&mut self) {
        if self.detached {
            return;
        }

        let max = self.sequence.max_position();
        if self.state.position >= max {
            self.state.position = max;
            self.state.running = false;
            self.clock.stop();
            trace!("play() at final step, nothing to do");
            self.sync_affordances();
            return;
        }

        if self.state.running && (self.clock.is_running() || self.state.pointer_captured) {
            trace!("play() while already playing, ignored");
            return;
        }

        self.state.running = true;
        if !self.state.pointer_captured {
            self.start_clock();
        }
        debug!("Playback started at {:.3}", self.state.position);
        self.sync_affordances();
    }

    /// Stop advancing; position stays where the last tick left it.
    pub fn pause(&mut self) {
        if self.detached {
            return;
        }
        let was_running = self.state.running;
        self.state.running = false;
        self.clock.stop();
        if was_running {
            debug!("Playback paused at {:.3}", self.state.position);
            self.sync_affordances();
        }
    }

    /// Rewind to the first step and play.
    pub fn restart(&mut self) {
        if self.detached {
            return;
        }
        if self.sequence.len() <= 1 {
            self.state.running = false;
            self.clock.stop();
            self.sync_affordances();
            return;
        }

        // Drop the old stream so play() anchors at 0, not at the stale start.
        self.clock.stop();
        self.state.running = false;
        self.state.position = 0.0;
        debug!("Playback restarted");
        self.emit_position();
        self.play();
    }

    /// Press whichever transport button is currently shown
    pub fn toggle_play(&mut self) {
        match self.playback_state() {
            PlaybackState::PausedMid => self.play(),
            PlaybackState::Playing => self.pause(),
            PlaybackState::AtEnd => self.restart(),
        }
    }

    // === Scrub handle ===

    /// Pointer pressed on the handle. Ticks stop until release.
    pub fn pointer_down(&mut self) {
        if self.detached {
            return;
        }
        self.state.pointer_captured = true;
        self.clock.stop();
        trace!("Pointer captured (running: {})", self.state.running);
    }

    /// Pointer released; resume from wherever the user left the handle.
    pub fn pointer_up(&mut self) {
        if !self.state.pointer_captured {
            return;
        }
        self.state.pointer_captured = false;
        trace!("Pointer released at {:.3}", self.state.position);

        if self.detached {
            return;
        }
        if self.state.running && self.state.position < self.sequence.max_position() {
            self.start_clock();
        }
    }

    /// Direct value change on the handle (drag or click on the track).
    ///
    /// Out-of-range values are clamped. Landing on the final step ends
    /// playback.
    pub fn manual_input(&mut self, raw: f64) {
        if self.detached {
            return;
        }
        let position = self.sequence.clamp_position(raw);
        self.state.position = position;

        if position >= self.sequence.max_position() {
            self.state.running = false;
            self.clock.stop();
        } else if self.clock.is_running() {
            // Keep playing from the new spot rather than jumping back to the old anchor.
            self.clock.stop();
            self.start_clock();
        }

        trace!("Manual input {:.3} -> {:.3}", raw, position);
        self.emit_position();
        self.sync_affordances();
    }

    /// Dispatch one input event
    pub fn handle_input(&mut self, input: ScrubInput) {
        match input {
            ScrubInput::Play => self.play(),
            ScrubInput::Pause => self.pause(),
            ScrubInput::Restart => self.restart(),
            ScrubInput::TogglePlay => self.toggle_play(),
            ScrubInput::PointerDown => self.pointer_down(),
            ScrubInput::PointerUp => self.pointer_up(),
            ScrubInput::Seek(value) => self.manual_input(value),
        }
    }

    // === Clock ===

    /// Advance playback by the time elapsed since the stream started.
    ///
    /// Called once per frame by the driver. Returns `Stop` when no stream is
    /// active or the stream just ended.
    pub fn tick(&mut self) -> TickFlow {
        let Some(elapsed_ms) = self.clock.elapsed_ms() else {
            return TickFlow::Stop;
        };

        if !self.state.running || self.state.pointer_captured {
            self.clock.stop();
            return TickFlow::Stop;
        }

        let max = self.sequence.max_position();
        let mut position = self.start_position + elapsed_ms / self.ms_per_step;
        let reached_end = position >= max;
        if reached_end {
            position = max;
        }

        self.state.position = position;
        trace!("Tick: {:.1}ms -> {:.3}", elapsed_ms, position);

        if reached_end {
            self.state.running = false;
            self.clock.stop();
            self.emit_position();
            debug!("Playback reached final step");
            self.sync_affordances();
            return TickFlow::Stop;
        }

        self.emit_position();
        TickFlow::Continue
    }

    // === Data ===

    /// Swap in a new sequence. Playback stops and the position moves to the
    /// new final step.
    pub fn replace_sequence(&mut self, labels: Vec<L>) -> Result<(), SequenceError> {
        let sequence = Arc::new(TimestepSequence::new(labels)?);
        self.replace_sequence_arc(sequence);
        Ok(())
    }

    pub fn replace_sequence_arc(&mut self, sequence: Arc<TimestepSequence<L>>) {
        if self.detached {
            return;
        }
        self.clock.stop();
        self.state = ScrubState::new(sequence.max_position());
        self.start_position = self.state.position;
        self.sequence = sequence;
        debug!("Sequence replaced: {} steps", self.sequence.len());
        self.emit_position();
        self.sync_affordances();
    }

    // === Internals ===

    fn start_clock(&mut self) {
        if self.clock.is_running() {
            return;
        }
        self.start_position = self.state.position;
        self.clock.start();
        if let Some(wake) = &self.clock_waker {
            wake();
        }
    }

    fn render_handle(&mut self) {
        let frame = HandleFrame::new(&self.sequence, self.state.position, &self.label_prefix);
        self.view.render_handle(&frame);
    }

    /// Notify downstream and redraw the handle
    fn emit_position(&mut self) {
        (self.on_position_changed)(self.state.position);
        self.render_handle();
    }

    fn sync_affordances(&mut self) {
        let affordances = self.affordances();
        self.view.render_affordances(affordances);
    }
}

impl<L> PlaybackController<L> {
    /// Stop everything; no tick mutates state afterwards.
    pub fn detach(&mut self) {
        if self.detached {
            return;
        }
        self.clock.stop();
        self.state.running = false;
        self.state.pointer_captured = false;
        self.detached = true;
        self.clock_waker = None;
        info!("PlaybackController detached at {:.3}", self.state.position);
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualTime;
    use crate::core::render_gate::RenderGate;
    use std::sync::Mutex;

    /// Records everything the controller draws
    #[derive(Clone, Default)]
    struct RecordingView {
        handles: Arc<Mutex<Vec<HandleFrame>>>,
        affordances: Arc<Mutex<Vec<Affordances>>>,
    }

    impl ScrubView for RecordingView {
        fn render_handle(&mut self, frame: &HandleFrame) {
            self.handles.lock().unwrap().push(frame.clone());
        }

        fn render_affordances(&mut self, affordances: Affordances) {
            self.affordances.lock().unwrap().push(affordances);
        }
    }

    struct Rig {
        ctrl: PlaybackController<i32>,
        time: Arc<ManualTime>,
        positions: Arc<Mutex<Vec<f64>>>,
        view: RecordingView,
    }

    fn rig(n: i32, initial_position: Option<f64>) -> Rig {
        let time = Arc::new(ManualTime::new());
        let positions = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&positions);
        let view = RecordingView::default();
        let options = BindOptions {
            initial_position,
            frame_interval: None,
            ..BindOptions::default()
        };
        let ctrl = PlaybackController::bind((0..n).collect(), options, move |p| {
            sink.lock().unwrap().push(p);
        })
        .unwrap()
        .with_time_source(time.clone())
        .with_view(Box::new(view.clone()));
        Rig {
            ctrl,
            time,
            positions,
            view,
        }
    }

    fn only(a: Affordances) -> &'static str {
        match (a.play, a.pause, a.restart) {
            (true, false, false) => "play",
            (false, true, false) => "pause",
            (false, false, true) => "restart",
            _ => "invalid",
        }
    }

    #[test]
    fn test_default_bind_starts_at_end() {
        let r = rig(5, None);
        assert_eq!(r.ctrl.position(), 4.0);
        assert!(!r.ctrl.is_running());
        assert_eq!(r.ctrl.playback_state(), PlaybackState::AtEnd);
        assert_eq!(only(r.ctrl.affordances()), "restart");
        assert_eq!(only(*r.view.affordances.lock().unwrap().last().unwrap()), "restart");
        // Binding alone does not notify downstream
        assert!(r.positions.lock().unwrap().is_empty());
    }

    #[test]
    fn test_restart_plays_from_zero() {
        let mut r = rig(5, None);
        r.ctrl.restart();
        assert_eq!(r.ctrl.position(), 0.0);
        assert!(r.ctrl.is_running());
        assert!(r.ctrl.is_clock_running());
        assert_eq!(r.ctrl.playback_state(), PlaybackState::Playing);
        assert_eq!(only(r.ctrl.affordances()), "pause");
        assert_eq!(*r.positions.lock().unwrap(), vec![0.0]);
    }

    #[test]
    fn test_ticks_interpolate_and_gate_step_crossings() {
        let mut r = rig(5, Some(0.0));
        let mut gate = RenderGate::new(Arc::clone(r.ctrl.sequence()));
        r.ctrl.play();

        let mut expensive = Vec::new();
        for _ in 0..10 {
            r.time.advance_ms(50);
            assert_eq!(r.ctrl.tick(), TickFlow::Continue);
            let d = gate.should_render_expensive(r.ctrl.position());
            expensive.push((d.label, d.render_expensive));
        }

        assert!((r.ctrl.position() - 2.5).abs() < 1e-9);
        assert_eq!(*r.ctrl.current_label(), 2);
        // 0.25 .. 2.5 in steps of 0.25
        let fired: Vec<i32> = expensive.iter().filter(|(_, e)| *e).map(|(l, _)| *l).collect();
        assert_eq!(fired, vec![0, 1, 2]);
        let within_two: Vec<bool> = expensive.iter().filter(|(l, _)| *l == 2).map(|(_, e)| *e).collect();
        assert_eq!(within_two, vec![true, false, false]);
    }

    #[test]
    fn test_callbacks_monotonic_while_playing() {
        let mut r = rig(20, Some(0.0));
        r.ctrl.play();
        for ms in [16, 17, 33, 5, 16, 40, 16] {
            r.time.advance_ms(ms);
            r.ctrl.tick();
        }
        let positions = r.positions.lock().unwrap();
        assert_eq!(positions.len(), 7);
        assert!(positions.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_clamps_at_end_and_stops_once() {
        let r = rig(5, Some(4.99));
        assert_eq!(r.ctrl.position(), 4.0);
        assert_eq!(r.ctrl.playback_state(), PlaybackState::AtEnd);

        let mut r = rig(5, Some(3.9));
        r.view.affordances.lock().unwrap().clear();
        r.ctrl.play();
        r.time.advance_ms(100);
        assert_eq!(r.ctrl.tick(), TickFlow::Stop);
        assert_eq!(r.ctrl.position(), 4.0);
        assert!(!r.ctrl.is_running());
        assert!(!r.ctrl.is_clock_running());

        r.time.advance_ms(500);
        assert_eq!(r.ctrl.tick(), TickFlow::Stop);
        assert_eq!(r.ctrl.position(), 4.0);
        assert_eq!(*r.positions.lock().unwrap(), vec![4.0]);

        let shown: Vec<&str> = r.view.affordances.lock().unwrap().iter().map(|a| only(*a)).collect();
        assert_eq!(shown, vec!["pause", "restart"]);
    }

    #[test]
    fn test_pointer_capture_suppresses_ticks_and_resumes_from_drag() {
        let mut r = rig(10, Some(0.0));
        r.ctrl.play();
        r.time.advance_ms(200);
        r.ctrl.tick();
        assert!((r.ctrl.position() - 1.0).abs() < 1e-9);

        r.ctrl.pointer_down();
        assert!(r.ctrl.is_running());
        assert!(!r.ctrl.is_clock_running());

        r.time.advance_ms(400);
        assert_eq!(r.ctrl.tick(), TickFlow::Stop);
        assert!((r.ctrl.position() - 1.0).abs() < 1e-9);

        r.ctrl.manual_input(6.0);
        r.time.advance_ms(400);
        r.ctrl.pointer_up();
        assert!(r.ctrl.is_clock_running());

        r.time.advance_ms(100);
        r.ctrl.tick();
        assert!((r.ctrl.position() - 6.5).abs() < 1e-9);
    }

    #[test]
    fn test_pointer_up_after_pause_does_not_resume() {
        let mut r = rig(10, Some(2.0));
        r.ctrl.play();
        r.ctrl.pointer_down();
        r.ctrl.pause();
        r.ctrl.pointer_up();
        assert!(!r.ctrl.is_running());
        assert!(!r.ctrl.is_clock_running());
    }

    #[test]
    fn test_play_while_captured_waits_for_release() {
        let mut r = rig(10, Some(2.0));
        r.ctrl.pointer_down();
        r.ctrl.play();
        assert!(r.ctrl.is_running());
        assert!(!r.ctrl.is_clock_running());
        assert_eq!(only(r.ctrl.affordances()), "pause");

        r.time.advance_ms(200);
        r.ctrl.tick();
        assert_eq!(r.ctrl.position(), 2.0);

        r.ctrl.pointer_up();
        r.time.advance_ms(200);
        r.ctrl.tick();
        assert!((r.ctrl.position() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut r = rig(10, Some(1.0));
        r.ctrl.play();
        r.time.advance_ms(100);
        r.ctrl.tick();

        r.ctrl.pause();
        let once = r.ctrl.state();
        r.ctrl.pause();
        assert_eq!(r.ctrl.state(), once);
        assert_eq!(r.ctrl.playback_state(), PlaybackState::PausedMid);
        assert_eq!(only(r.ctrl.affordances()), "play");

        // No callback for pausing, no more ticks
        let count = r.positions.lock().unwrap().len();
        r.time.advance_ms(500);
        assert_eq!(r.ctrl.tick(), TickFlow::Stop);
        assert_eq!(r.positions.lock().unwrap().len(), count);
    }

    #[test]
    fn test_manual_input_clamps_and_ends() {
        let mut r = rig(5, Some(1.0));
        r.ctrl.play();
        r.ctrl.manual_input(17.0);
        assert_eq!(r.ctrl.position(), 4.0);
        assert!(!r.ctrl.is_running());
        assert!(!r.ctrl.is_clock_running());
        assert_eq!(only(r.ctrl.affordances()), "restart");

        r.ctrl.manual_input(-3.0);
        assert_eq!(r.ctrl.position(), 0.0);
        assert_eq!(only(r.ctrl.affordances()), "play");
        assert_eq!(*r.positions.lock().unwrap(), vec![4.0, 0.0]);

        let last = r.view.handles.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last.label, "Step 0");
    }

    #[test]
    fn test_manual_input_while_playing_reanchors() {
        let mut r = rig(10, Some(0.0));
        r.ctrl.play();
        r.time.advance_ms(400);
        r.ctrl.tick();
        r.ctrl.manual_input(5.0);
        r.time.advance_ms(200);
        r.ctrl.tick();
        assert!((r.ctrl.position() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_double_play_is_idempotent() {
        let mut r = rig(10, Some(0.0));
        r.ctrl.play();
        r.time.advance_ms(200);
        r.ctrl.play();
        r.time.advance_ms(200);
        r.ctrl.tick();
        // Anchor unchanged by the second play()
        assert!((r.ctrl.position() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_step_sequence() {
        let mut r = rig(1, None);
        assert_eq!(r.ctrl.playback_state(), PlaybackState::AtEnd);
        r.ctrl.play();
        r.ctrl.restart();
        assert_eq!(r.ctrl.position(), 0.0);
        assert!(!r.ctrl.is_running());
        assert!(!r.ctrl.is_clock_running());
        assert_eq!(only(r.ctrl.affordances()), "restart");
        assert!(r.positions.lock().unwrap().is_empty());
    }

    #[test]
    fn test_toggle_follows_visible_button() {
        let mut r = rig(5, None);
        r.ctrl.handle_input(ScrubInput::TogglePlay);
        assert_eq!(r.ctrl.playback_state(), PlaybackState::Playing);
        assert_eq!(r.ctrl.position(), 0.0);
        r.ctrl.handle_input(ScrubInput::TogglePlay);
        assert_eq!(r.ctrl.playback_state(), PlaybackState::PausedMid);
        r.ctrl.handle_input(ScrubInput::TogglePlay);
        assert_eq!(r.ctrl.playback_state(), PlaybackState::Playing);
    }

    #[test]
    fn test_invalid_sequence_fails_bind() {
        let empty = PlaybackController::<i32>::bind(vec![], BindOptions::default(), |_| {});
        assert_eq!(empty.unwrap_err(), SequenceError::Empty);

        let unsorted = PlaybackController::bind(vec![3, 1, 2], BindOptions::default(), |_| {});
        assert!(matches!(unsorted.unwrap_err(), SequenceError::Unordered { .. }));
    }

    #[test]
    fn test_replace_sequence_resets_state() {
        let mut r = rig(5, Some(0.0));
        r.ctrl.play();
        r.ctrl.replace_sequence(vec![10, 20, 30]).unwrap();
        assert_eq!(r.ctrl.position(), 2.0);
        assert!(!r.ctrl.is_running());
        assert!(!r.ctrl.is_clock_running());
        assert_eq!(*r.ctrl.current_label(), 30);

        assert!(r.ctrl.replace_sequence(vec![]).is_err());
        assert_eq!(r.ctrl.sequence().len(), 3);
    }

    #[test]
    fn test_detach_stops_ticks() {
        let mut r = rig(10, Some(0.0));
        r.ctrl.play();
        r.ctrl.detach();
        r.time.advance_ms(400);
        assert_eq!(r.ctrl.tick(), TickFlow::Stop);
        assert_eq!(r.ctrl.position(), 0.0);

        r.ctrl.play();
        assert!(!r.ctrl.is_clock_running());
    }

    #[test]
    fn test_detached_controller_ignores_input() {
        let mut r = rig(5, None);
        r.ctrl.detach();
        let affordances_drawn = r.view.affordances.lock().unwrap().len();

        r.ctrl.manual_input(2.0);
        r.ctrl.restart();
        r.ctrl.pointer_down();
        r.ctrl.pause();
        r.ctrl.handle_input(ScrubInput::Seek(1.0));
        r.ctrl.replace_sequence(vec![7, 8]).unwrap();

        assert_eq!(r.ctrl.position(), 4.0);
        assert_eq!(r.ctrl.sequence().len(), 5);
        assert!(!r.ctrl.is_pointer_captured());
        assert!(r.positions.lock().unwrap().is_empty());
        assert_eq!(r.view.affordances.lock().unwrap().len(), affordances_drawn);
    }

    #[test]
    fn test_clock_waker_fires_on_stream_start() {
        let wakes = Arc::new(Mutex::new(0usize));
        let w = Arc::clone(&wakes);
        let mut r = rig(10, Some(0.0));
        r.ctrl.set_clock_waker(Box::new(move || *w.lock().unwrap() += 1));

        r.ctrl.play();
        r.ctrl.play();
        assert_eq!(*wakes.lock().unwrap(), 1);

        // Re-anchoring starts a new stream
        r.ctrl.manual_input(3.0);
        assert_eq!(*wakes.lock().unwrap(), 2);

        r.ctrl.pause();
        r.ctrl.detach();
        r.ctrl.play();
        assert_eq!(*wakes.lock().unwrap(), 2);
    }

    #[test]
    fn test_zero_ms_per_step_is_normalized() {
        let ctrl = PlaybackController::bind(
            vec![1, 2, 3],
            BindOptions {
                ms_per_step: 0,
                ..BindOptions::default()
            },
            |_| {},
        )
        .unwrap();
        assert_eq!(ctrl.ms_per_step(), 1.0);
    }
}
