//! Visual collaborator of the controller: scrub handle, label and buttons.
//!
//! Drawing is not the controller's business. It hands a `HandleFrame` to the
//! view on every position change and the current `Affordances` on every
//! state transition; how those become pixels or text is up to the view.

use super::scrub_state::Affordances;
use super::sequence::{TimeLabel, TimestepSequence};

/// Default text in front of the step label
pub const DEFAULT_LABEL_PREFIX: &str = "Step";

/// Everything a view needs to draw the scrub handle
#[derive(Clone, Debug, PartialEq)]
pub struct HandleFrame {
    /// Continuous position in `[0, N-1]`
    pub position: f64,
    /// Position along the track, 0.0 at the first step and 1.0 at the last
    pub fraction: f64,
    /// Text shown next to the handle, e.g. "Step 12"
    pub label: String,
}

impl HandleFrame {
    pub fn new<L: TimeLabel>(sequence: &TimestepSequence<L>, position: f64, prefix: &str) -> Self {
        let max = sequence.max_position();
        let fraction = if max > 0.0 { position / max } else { 1.0 };
        let step = sequence.label_at(position);
        let label = if prefix.is_empty() {
            step.to_string()
        } else {
            format!("{} {}", prefix, step)
        };
        Self {
            position,
            fraction,
            label,
        }
    }
}

/// Receiver of handle and transport-button updates
pub trait ScrubView: Send {
    /// Called synchronously on every position change
    fn render_handle(&mut self, frame: &HandleFrame);

    /// Called synchronously on every state transition
    fn render_affordances(&mut self, affordances: Affordances);
}

/// View that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl ScrubView for NullView {
    fn render_handle(&mut self, _frame: &HandleFrame) {}

    fn render_affordances(&mut self, _affordances: Affordances) {}
}
