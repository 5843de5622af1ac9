//! Views - concrete renderers for the controller's scrub handle and buttons
//!
//! Each view implements `ScrubView` and is handed to the controller at bind time.

pub mod terminal;

pub use terminal::TerminalView;
