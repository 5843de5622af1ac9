//! Text scrub bar for terminals and logs.
//!
//! Renders one line per update:
//! ```text
//! [pause] |==========>---------| Step 12 | 4.37
//! ```

use log::warn;
use std::io::Write;

use crate::core::scrub_state::Affordances;
use crate::core::view::{HandleFrame, ScrubView};

/// Default number of cells in the track
pub const DEFAULT_TRACK_WIDTH: usize = 30;

/// Writes a monospace scrub bar to any writer
pub struct TerminalView<W: Write + Send> {
    out: W,
    track_width: usize,
    /// Button currently shown, mirrored from the last affordance update
    button: &'static str,
    /// Last drawn handle, redrawn when the button changes
    last_frame: Option<HandleFrame>,
    write_failed: bool,
}

impl TerminalView<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            track_width: DEFAULT_TRACK_WIDTH,
            button: "",
            last_frame: None,
            write_failed: false,
        }
    }

    pub fn with_track_width(mut self, width: usize) -> Self {
        self.track_width = width.max(2);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Format a line without writing it
    pub fn format_line(&self, frame: &HandleFrame) -> String {
        let cells = self.track_width;
        let head = ((frame.fraction.clamp(0.0, 1.0) * (cells - 1) as f64).round()) as usize;
        let mut track = String::with_capacity(cells);
        for i in 0..cells {
            track.push(match i.cmp(&head) {
                std::cmp::Ordering::Less => '=',
                std::cmp::Ordering::Equal => '>',
                std::cmp::Ordering::Greater => '-',
            });
        }
        format!(
            "[{:^7}] |{}| {} | {:.2}",
            self.button, track, frame.label, frame.position
        )
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{}", line) {
            // Report once; a closed pipe would otherwise flood the log
            if !self.write_failed {
                warn!("TerminalView: write failed: {}", e);
                self.write_failed = true;
            }
        }
    }
}

impl<W: Write + Send> ScrubView for TerminalView<W> {
    fn render_handle(&mut self, frame: &HandleFrame) {
        let line = self.format_line(frame);
        self.write_line(&line);
        self.last_frame = Some(frame.clone());
    }

    fn render_affordances(&mut self, affordances: Affordances) {
        let button = if affordances.play {
            "play"
        } else if affordances.pause {
            "pause"
        } else {
            "restart"
        };
        if button == self.button {
            return;
        }
        self.button = button;
        if let Some(frame) = self.last_frame.clone() {
            let line = self.format_line(&frame);
            self.write_line(&line);
        }
    }
}
