//! Connects one visualization to a controller's position stream.
//!
//! A binding splits every position update into two paths:
//! - `render_time(position)` - cheap, always, with the continuous position
//! - `render_step(label)` - expensive, only when the discrete step changes
//!
//! It also remembers which step the user picked, so that fresh data for the
//! same timeline keeps the user on that step instead of snapping to the end.
//! Picking the final step means "follow the latest" and clears the memory.
//!
//! # Usage
//! ```ignore
//! let mut binding = TimelineBinding::new(sequence, draw_payload, move_marker);
//! let start = binding.attach();
//! let handle = ControllerHandle::bind(labels, BindOptions { initial_position: Some(start), ..Default::default() },
//!     move |p| binding.select(p))?;
//! ```

use log::{debug, trace};
use std::fmt;
use std::sync::Arc;

use super::render_gate::RenderGate;
use super::sequence::{TimeLabel, TimestepSequence};

/// Expensive renderer: recompute the payload for one discrete step
pub type StepRenderer<L> = Box<dyn FnMut(&L) + Send>;

/// Cheap renderer: reproject already computed values at a continuous position
pub type TimeRenderer = Box<dyn FnMut(f64) + Send>;

/// Gated renderer pair for a single visualization
pub struct TimelineBinding<L> {
    gate: RenderGate<L>,
    /// Step the user picked; None follows the final step
    user_selected: Option<L>,
    render_step: StepRenderer<L>,
    render_time: TimeRenderer,
    expensive_renders: usize,
}

impl<L: TimeLabel> fmt::Debug for TimelineBinding<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineBinding")
            .field("user_selected", &self.user_selected)
            .field("last_rendered", &self.gate.last_rendered())
            .field("expensive_renders", &self.expensive_renders)
            .finish()
    }
}

impl<L: TimeLabel> TimelineBinding<L> {
    pub fn new<S, T>(sequence: Arc<TimestepSequence<L>>, render_step: S, render_time: T) -> Self
    where
        S: FnMut(&L) + Send + 'static,
        T: FnMut(f64) + Send + 'static,
    {
        Self {
            gate: RenderGate::new(sequence),
            user_selected: None,
            render_step: Box::new(render_step),
            render_time: Box::new(render_time),
            expensive_renders: 0,
        }
    }

    /// Draw the initial state and return the position to start the controller at.
    ///
    /// The selected step (or the final one) is always rendered here, even if
    /// the gate already saw it.
    pub fn attach(&mut self) -> f64 {
        let position = self.resolve_position();
        self.gate.invalidate();
        self.select(position);
        position
    }

    /// Position update from the controller.
    pub fn select(&mut self, position: f64) {
        let sequence = Arc::clone(self.gate.sequence());
        let index = sequence.index_at(position);

        if index + 1 == sequence.len() {
            self.user_selected = None;
        } else {
            self.user_selected = Some(sequence.labels()[index].clone());
        }

        let decision = self.gate.should_render_expensive(position);
        if decision.render_expensive {
            trace!("TimelineBinding: rendering step {}", decision.label);
            (self.render_step)(&decision.label);
            self.expensive_renders += 1;
        }

        (self.render_time)(position);
    }

    /// New data for the same timeline.
    ///
    /// Keeps the user's step when it still exists, otherwise follows the
    /// final step. Redraws and returns the position to seek the controller to.
    pub fn replace_sequence(&mut self, sequence: Arc<TimestepSequence<L>>) -> f64 {
        debug!("TimelineBinding: sequence replaced ({} steps)", sequence.len());
        self.gate.set_sequence(sequence);
        self.attach()
    }

    /// Step the user picked, if not following the latest
    pub fn user_selected(&self) -> Option<&L> {
        self.user_selected.as_ref()
    }

    /// Number of times the expensive path ran
    pub fn expensive_renders(&self) -> usize {
        self.expensive_renders
    }

    pub fn sequence(&self) -> &Arc<TimestepSequence<L>> {
        self.gate.sequence()
    }

    fn resolve_position(&self) -> f64 {
        let sequence = self.gate.sequence();
        self.user_selected
            .as_ref()
            .and_then(|label| sequence.index_of(label))
            .map(|index| index as f64)
            .unwrap_or_else(|| sequence.max_position())
    }
}
