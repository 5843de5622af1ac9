//! Inbound scrub and transport events.

use std::fmt;
use std::str::FromStr;

/// One user or caller action against a controller
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrubInput {
    // === Transport ===
    Play,
    Pause,
    Restart,
    /// Press whichever transport button is visible
    TogglePlay,

    // === Scrub handle ===
    PointerDown,
    PointerUp,
    /// Direct value change from dragging or clicking the track
    Seek(f64),
}

/// Error for unparseable input names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseInputError(pub String);

impl fmt::Display for ParseInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown scrub input: {}", self.0)
    }
}

impl std::error::Error for ParseInputError {}

impl FromStr for ScrubInput {
    type Err = ParseInputError;

    /// Parses `play`, `pause`, `restart`, `toggle`, `down`, `up`, `seek:<pos>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "play" => return Ok(ScrubInput::Play),
            "pause" => return Ok(ScrubInput::Pause),
            "restart" => return Ok(ScrubInput::Restart),
            "toggle" => return Ok(ScrubInput::TogglePlay),
            "down" | "pointer-down" => return Ok(ScrubInput::PointerDown),
            "up" | "pointer-up" => return Ok(ScrubInput::PointerUp),
            _ => {}
        }
        if let Some(value) = s.strip_prefix("seek:") {
            return value
                .trim()
                .parse::<f64>()
                .map(ScrubInput::Seek)
                .map_err(|_| ParseInputError(s.to_string()));
        }
        Err(ParseInputError(s.to_string()))
    }
}
