use anyhow::{Context, Result};
use clap::Parser;
use indexmap::IndexMap;
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use stepscrub::cli::{self, Args, ScriptStep};
use stepscrub::config::{self, PathConfig, PlaybackSettings};
use stepscrub::core::view::{NullView, ScrubView};
use stepscrub::{
    BindingId, ControllerHandle, PlaybackState, RenderGateStore, ScrubState, TerminalView, TimelineBinding,
    TimestepSequence,
};

/// Poll cadence while waiting on playback without a frame driver
const HOST_FRAME: Duration = Duration::from_millis(16);

/// Everything bound to the timeline: one remembered-selection binding plus
/// a set of gated views sharing a store.
struct Visuals {
    primary: TimelineBinding<f64>,
    gates: RenderGateStore<f64>,
    views: IndexMap<BindingId, ViewStats>,
}

struct ViewStats {
    name: String,
    expensive: usize,
}

impl Visuals {
    fn on_position(&mut self, position: f64) {
        self.primary.select(position);
        self.render_views(position);
    }

    /// Gated draw of every view; the first call is the initial render
    fn render_views(&mut self, position: f64) {
        for (id, stats) in self.views.iter_mut() {
            let decision = self.gates.decide(*id, position);
            if decision.render_expensive {
                debug!("{}: recompute for step {}", stats.name, decision.label);
                stats.expensive += 1;
            }
        }
    }
}

#[derive(Serialize)]
struct RunSummary {
    state: ScrubState,
    playback: PlaybackState,
    label: f64,
    renders: Vec<ViewSummary>,
}

#[derive(Serialize)]
struct ViewSummary {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<BindingId>,
    expensive: usize,
}

fn init_logging(args: &Args, path_config: &PathConfig) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| config::config_file("stepscrub.log", path_config));
        if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level.max(log::LevelFilter::Debug))
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Respects RUST_LOG if set
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

/// Sleep for `duration`, ticking the controller ourselves when nothing else does
fn wait(handle: &ControllerHandle<f64>, duration: Duration) {
    if handle.is_driven() {
        thread::sleep(duration);
        return;
    }
    let deadline = Instant::now() + duration;
    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(HOST_FRAME.min(deadline - now));
        handle.tick();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    init_logging(&args, &path_config)?;

    info!("stepscrub starting...");
    debug!("Command-line args: {:?}", args);

    let mut settings = PlaybackSettings::load_or_default(&path_config)?;
    args.apply(&mut settings);
    debug!("Settings: {:?}", settings);

    let script = cli::parse_script(&args.script)?;
    let labels = args.labels();
    let sequence = Arc::new(TimestepSequence::new(labels.clone()).context("Invalid timesteps")?);
    info!(
        "Timeline: {} steps ({} .. {})",
        sequence.len(),
        sequence.labels()[0],
        sequence.last()
    );

    let mut primary = TimelineBinding::new(
        Arc::clone(&sequence),
        |label: &f64| debug!("primary: recompute for step {}", label),
        |position| trace!("primary: reproject at {:.3}", position),
    );
    let start = primary.attach();

    let mut options = settings.bind_options();
    let initial = match options.initial_position {
        Some(position) => {
            primary.select(position);
            position
        }
        None => start,
    };
    options.initial_position = Some(initial);

    let views = (0..args.views)
        .map(|i| {
            let stats = ViewStats {
                name: format!("view-{}", i + 1),
                expensive: 0,
            };
            (BindingId::new(), stats)
        })
        .collect();
    let mut visuals = Visuals {
        primary,
        gates: RenderGateStore::new(Arc::clone(&sequence)),
        views,
    };
    visuals.render_views(initial);
    let visuals = Arc::new(Mutex::new(visuals));

    let view: Box<dyn ScrubView> = if args.quiet {
        Box::new(NullView)
    } else {
        Box::new(TerminalView::stdout())
    };

    let sink = Arc::clone(&visuals);
    let handle = ControllerHandle::bind_with_view(labels, options, view, move |position| {
        sink.lock().unwrap_or_else(|e| e.into_inner()).on_position(position);
    })?;
    info!("Bound controller (driven: {})", handle.is_driven());

    for step in script {
        match step {
            ScriptStep::Input(input) => {
                debug!("Script: {:?}", input);
                handle.send(input);
            }
            ScriptStep::Wait(duration) => wait(&handle, duration),
        }
    }

    // Let any running playback finish
    let timeout = Duration::from_millis(args.timeout_ms);
    let started = Instant::now();
    while handle.playback_state() == PlaybackState::Playing {
        if started.elapsed() >= timeout {
            warn!("Playback did not finish within {} ms", args.timeout_ms);
            break;
        }
        wait(&handle, HOST_FRAME);
    }

    let state = handle.state();
    let playback = handle.playback_state();
    let label = handle.current_label();
    handle.detach();

    let visuals = visuals.lock().unwrap_or_else(|e| e.into_inner());
    let mut renders = vec![ViewSummary {
        name: "primary".to_string(),
        id: None,
        expensive: visuals.primary.expensive_renders(),
    }];
    renders.extend(visuals.views.iter().map(|(id, stats)| ViewSummary {
        name: stats.name.clone(),
        id: Some(*id),
        expensive: stats.expensive,
    }));

    if !args.quiet {
        println!();
    }
    let summary = RunSummary {
        state,
        playback,
        label,
        renders,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
