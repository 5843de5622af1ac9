use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::PlaybackSettings;
use crate::core::scrub_events::ScrubInput;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Number of steps used when neither --steps nor --count is given
pub const DEFAULT_STEP_COUNT: usize = 10;

/// Headless timeline scrubber: plays a timestep sequence and reports renders
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Timestep labels, ascending and comma separated (e.g. 0,10,20,40)
    #[arg(short = 's', long = "steps", value_name = "LIST", value_delimiter = ',', allow_hyphen_values = true, conflicts_with = "count")]
    pub steps: Option<Vec<f64>>,

    /// Use labels 0..N instead of an explicit list
    #[arg(short = 'n', long = "count", value_name = "N")]
    pub count: Option<usize>,

    /// Playback speed in milliseconds per step (default: 200)
    #[arg(long = "ms-per-step", value_name = "MS")]
    pub ms_per_step: Option<u32>,

    /// Frame cadence in milliseconds; 0 ticks from the main thread instead
    #[arg(long = "frame-interval", value_name = "MS")]
    pub frame_interval: Option<u64>,

    /// Text in front of the step label (default: "Step")
    #[arg(long = "prefix", value_name = "TEXT")]
    pub prefix: Option<String>,

    /// Start position (default: last step)
    #[arg(long = "position", value_name = "POS", allow_hyphen_values = true)]
    pub position: Option<f64>,

    /// Actions to run: play, pause, restart, toggle, down, up, seek:X, wait:MS
    #[arg(long = "script", value_name = "ACTIONS", default_value = "restart")]
    pub script: String,

    /// Give up waiting for playback to finish after this many milliseconds
    #[arg(long = "timeout", value_name = "MS", default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Number of simulated visualizations sharing the timeline
    #[arg(long = "views", value_name = "N", default_value_t = 3)]
    pub views: usize,

    /// Do not draw the scrub bar
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Enable debug logging to file (default: stepscrub.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Args {
    /// Timestep labels requested on the command line
    pub fn labels(&self) -> Vec<f64> {
        match (&self.steps, self.count) {
            (Some(steps), _) => steps.clone(),
            (None, Some(n)) => (0..n).map(|i| i as f64).collect(),
            (None, None) => (0..DEFAULT_STEP_COUNT).map(|i| i as f64).collect(),
        }
    }

    /// Override file settings with explicit flags
    pub fn apply(&self, settings: &mut PlaybackSettings) {
        if let Some(ms) = self.ms_per_step {
            settings.ms_per_step = ms;
        }
        if let Some(ms) = self.frame_interval {
            settings.frame_interval_ms = ms;
        }
        if let Some(prefix) = &self.prefix {
            settings.label_prefix = prefix.clone();
        }
        if self.position.is_some() {
            settings.initial_position = self.position;
        }
    }
}

/// One entry of a --script
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScriptStep {
    Input(ScrubInput),
    Wait(Duration),
}

/// Parse a comma separated action list
pub fn parse_script(script: &str) -> Result<Vec<ScriptStep>> {
    let mut steps = Vec::new();
    for token in script.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some(ms) = token.strip_prefix("wait:") {
            let ms: u64 = ms
                .trim()
                .parse()
                .with_context(|| format!("Bad wait duration in script: {}", token))?;
            steps.push(ScriptStep::Wait(Duration::from_millis(ms)));
            continue;
        }
        match token.parse::<ScrubInput>() {
            Ok(input) => steps.push(ScriptStep::Input(input)),
            Err(e) => bail!("{}", e),
        }
    }
    Ok(steps)
}
