//! Render gating - decides when a visualization must recompute.
//!
//! During playback the position changes every frame but the discrete step
//! changes only a few times per second. Visualizations split their work:
//! 1. Cheap path (handle, numeric label) runs on every position change
//! 2. Expensive path (recomputing the payload) runs once per step crossing
//!
//! Each visualization owns one `RenderGate`. Hosts with many elements keep
//! them in a `RenderGateStore` keyed by a stable `BindingId` instead of
//! hanging state off rendered nodes.

use indexmap::IndexMap;
use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::sequence::{TimeLabel, TimestepSequence};

/// Result of consulting a gate
#[derive(Clone, Debug, PartialEq)]
pub struct GateDecision<L> {
    /// Label at `floor(position)`
    pub label: L,
    /// True when the expensive path must run for this label
    pub render_expensive: bool,
}

/// Per-element cache of the last label that triggered an expensive render.
#[derive(Clone, Debug)]
pub struct RenderGate<L> {
    sequence: Arc<TimestepSequence<L>>,
    last_rendered: Option<L>,
}

impl<L: TimeLabel> RenderGate<L> {
    pub fn new(sequence: Arc<TimestepSequence<L>>) -> Self {
        Self {
            sequence,
            last_rendered: None,
        }
    }

    /// Decide whether `position` requires an expensive render.
    ///
    /// Records the label when it does, so the next call for the same step
    /// returns false.
    pub fn should_render_expensive(&mut self, position: f64) -> GateDecision<L> {
        let label = self.sequence.label_at(position).clone();
        let render_expensive = self.last_rendered.as_ref() != Some(&label);
        if render_expensive {
            trace!("RenderGate: step {} needs expensive render", label);
            self.last_rendered = Some(label.clone());
        }
        GateDecision {
            label,
            render_expensive,
        }
    }

    /// Last label that went through the expensive path
    pub fn last_rendered(&self) -> Option<&L> {
        self.last_rendered.as_ref()
    }

    /// Forget the cached label; the next decision renders.
    pub fn invalidate(&mut self) {
        self.last_rendered = None;
    }

    /// Swap in new data. Cached labels refer to the old data, so they are dropped.
    pub fn set_sequence(&mut self, sequence: Arc<TimestepSequence<L>>) {
        self.sequence = sequence;
        self.last_rendered = None;
    }

    pub fn sequence(&self) -> &Arc<TimestepSequence<L>> {
        &self.sequence
    }
}

/// Stable identity of a bound visualization element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingId(Uuid);

impl BindingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BindingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keyed gates for every element bound to one timeline.
///
/// Gates are created lazily on first use and live until removed.
#[derive(Clone, Debug)]
pub struct RenderGateStore<L> {
    sequence: Arc<TimestepSequence<L>>,
    gates: IndexMap<BindingId, RenderGate<L>>,
}

impl<L: TimeLabel> RenderGateStore<L> {
    pub fn new(sequence: Arc<TimestepSequence<L>>) -> Self {
        Self {
            sequence,
            gates: IndexMap::new(),
        }
    }

    /// Gate for `id`, created on first access
    pub fn gate_mut(&mut self, id: BindingId) -> &mut RenderGate<L> {
        let sequence = &self.sequence;
        self.gates
            .entry(id)
            .or_insert_with(|| RenderGate::new(Arc::clone(sequence)))
    }

    /// Consult the gate for `id` at `position`
    pub fn decide(&mut self, id: BindingId, position: f64) -> GateDecision<L> {
        self.gate_mut(id).should_render_expensive(position)
    }

    pub fn get(&self, id: BindingId) -> Option<&RenderGate<L>> {
        self.gates.get(&id)
    }

    /// Drop the gate of an element that went away
    pub fn remove(&mut self, id: BindingId) -> Option<RenderGate<L>> {
        self.gates.shift_remove(&id)
    }

    /// Replace the shared sequence; every gate is reset.
    pub fn set_sequence(&mut self, sequence: Arc<TimestepSequence<L>>) {
        for gate in self.gates.values_mut() {
            gate.set_sequence(Arc::clone(&sequence));
        }
        self.sequence = sequence;
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Ids in the order they were first seen
    pub fn ids(&self) -> impl Iterator<Item = BindingId> + '_ {
        self.gates.keys().copied()
    }
}
