//! Core engine modules - sequence, clock, gating, controller
//!
//! These modules form the playback engine, independent of any UI.

pub mod binding;
pub mod clock;
pub mod controller;
pub mod driver;
pub mod handle;
pub mod render_gate;
pub mod scrub_events;
pub mod scrub_state;
pub mod sequence;
pub mod view;

// Re-exports for convenience
pub use binding::TimelineBinding;
pub use clock::{ManualTime, MonotonicTime, PlaybackClock, TickFlow, TimeSource};
pub use controller::{BindOptions, PlaybackController, DEFAULT_FRAME_INTERVAL, DEFAULT_MS_PER_STEP};
pub use driver::{FrameDriver, FrameWaker};
pub use handle::{BindError, ControllerHandle};
pub use render_gate::{BindingId, GateDecision, RenderGate, RenderGateStore};
pub use scrub_events::ScrubInput;
pub use scrub_state::{Affordances, PlaybackState, ScrubState};
pub use sequence::{SequenceError, TimeLabel, TimestepSequence};
pub use view::{HandleFrame, NullView, ScrubView};
