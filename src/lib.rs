//! STEPSCRUB - Timestep playback and scrubbing controller
//!
//! Re-exports all modules for use by binary targets.

// Core engine (sequence, clock, controller, gates)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod widgets;

// Re-export commonly used types from core
pub use core::binding::TimelineBinding;
pub use core::clock::{ManualTime, MonotonicTime, PlaybackClock, TickFlow, TimeSource};
pub use core::controller::{BindOptions, PlaybackController};
pub use core::handle::{BindError, ControllerHandle};
pub use core::render_gate::{BindingId, GateDecision, RenderGate, RenderGateStore};
pub use core::scrub_events::ScrubInput;
pub use core::scrub_state::{Affordances, PlaybackState, ScrubState};
pub use core::sequence::{SequenceError, TimeLabel, TimestepSequence};
pub use core::view::{HandleFrame, NullView, ScrubView};

pub use config::PlaybackSettings;
pub use widgets::TerminalView;
