//! Scrub position state and the play/pause/restart state machine.
//!
//! `ScrubState` holds the only mutable playback data. `PlaybackState` and
//! `Affordances` are pure projections of it and are recomputed on demand,
//! never stored alongside it.

use serde::Serialize;

/// Authoritative playback state owned by a controller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScrubState {
    /// Continuous position in `[0, N-1]`
    pub position: f64,
    /// Playback requested (forced false at the end)
    pub running: bool,
    /// Pointer is held on the scrub handle; clock ticks are suppressed
    pub pointer_captured: bool,
}

impl ScrubState {
    pub fn new(position: f64) -> Self {
        Self {
            position,
            running: false,
            pointer_captured: false,
        }
    }

    /// Derive the visible playback state for a sequence whose last position is `max`.
    pub fn playback_state(&self, max: f64) -> PlaybackState {
        if self.position >= max {
            PlaybackState::AtEnd
        } else if self.running {
            PlaybackState::Playing
        } else {
            PlaybackState::PausedMid
        }
    }
}

/// Derived playback state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PlaybackState {
    /// Stopped somewhere before the final step
    PausedMid,
    /// Advancing toward the final step
    Playing,
    /// Sitting on the final step
    AtEnd,
}

impl PlaybackState {
    pub fn affordances(self) -> Affordances {
        Affordances::from(self)
    }
}

/// Which transport buttons are visible. Exactly one is shown at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Affordances {
    pub play: bool,
    pub pause: bool,
    pub restart: bool,
}

impl From<PlaybackState> for Affordances {
    fn from(state: PlaybackState) -> Self {
        match state {
            PlaybackState::PausedMid => Self {
                play: true,
                pause: false,
                restart: false,
            },
            PlaybackState::Playing => Self {
                play: false,
                pause: true,
                restart: false,
            },
            PlaybackState::AtEnd => Self {
                play: false,
                pause: false,
                restart: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_derivation() {
        let mut state = ScrubState::new(4.0);
        assert_eq!(state.playback_state(4.0), PlaybackState::AtEnd);

        // Running is irrelevant at the end
        state.running = true;
        assert_eq!(state.playback_state(4.0), PlaybackState::AtEnd);

        state.position = 1.5;
        assert_eq!(state.playback_state(4.0), PlaybackState::Playing);

        state.running = false;
        assert_eq!(state.playback_state(4.0), PlaybackState::PausedMid);
    }

    #[test]
    fn test_affordance_table() {
        let paused = PlaybackState::PausedMid.affordances();
        assert!(paused.play && !paused.pause && !paused.restart);

        let playing = PlaybackState::Playing.affordances();
        assert!(!playing.play && playing.pause && !playing.restart);

        let end = PlaybackState::AtEnd.affordances();
        assert!(!end.play && !end.pause && end.restart);
    }

    #[test]
    fn test_single_step_is_always_at_end() {
        let state = ScrubState::new(0.0);
        assert_eq!(state.playback_state(0.0), PlaybackState::AtEnd);
    }
}
