use std::{
    cell::RefCell,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    rc::Rc,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

use scrollpath::{
    Affine, Ease, Easing, EngineConfig, FrameLoop, ManualFrameScheduler, ParallaxLayerDef,
    ProgressEngine, ScrollMetrics, SharedScroll, SvgPath,
};

#[derive(Parser, Debug)]
#[command(name = "scrollpath", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive a scenario through the engine and print one JSON line per event.
    Simulate(SimulateArgs),
    /// Tabulate an easing curve.
    Ease(EaseArgs),
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input scenario JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frames per second used to timestamp scroll samples.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Output file (JSON lines). Defaults to stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct EaseArgs {
    /// Easing name (table entry or CSS preset).
    #[arg(required_unless_present = "list")]
    name: Option<String>,

    /// Number of evenly spaced samples, endpoints included.
    #[arg(long, default_value_t = 11)]
    samples: usize,

    /// List the built-in names instead.
    #[arg(long)]
    list: bool,
}

/// Scenario file: an engine configuration, a path and a sequence of scroll samples.
#[derive(serde::Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct Scenario {
    #[serde(default)]
    config: EngineConfig,
    /// SVG path data.
    path: String,
    /// Curve-local to screen transform as `[a, b, c, d, e, f]`; identity when absent.
    #[serde(default)]
    transform: Option<[f64; 6]>,
    cross_extent: f64,
    content_extent: f64,
    viewport_extent: f64,
    #[serde(default)]
    layers: Vec<ParallaxLayerDef>,
    /// One scroll offset per frame; `null` means the scroll target is missing that frame.
    scroll: Vec<Option<f64>>,
}

enum Record {
    Segment(scrollpath::SegmentEvent),
    State(scrollpath::FollowerState),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Simulate(args) => cmd_simulate(args),
        Command::Ease(args) => cmd_ease(args),
    }
}

fn read_scenario(path: &Path) -> anyhow::Result<Scenario> {
    let f = File::open(path).with_context(|| format!("open scenario '{}'", path.display()))?;
    let scenario: Scenario =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse scenario JSON")?;
    Ok(scenario)
}

fn open_output(out: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match out {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            let f = File::create(path)
                .with_context(|| format!("create output '{}'", path.display()))?;
            Box::new(BufWriter::new(f))
        }
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    if !(args.fps > 0.0 && args.fps.is_finite()) {
        anyhow::bail!("--fps must be positive, got {}", args.fps);
    }
    let scenario = read_scenario(&args.in_path)?;
    let path = SvgPath::parse(&scenario.path).context("compile scenario path")?;

    let scroll = SharedScroll::new();
    let mut engine = ProgressEngine::new(&scenario.config, scroll.clone())
        .context("build engine")?
        .with_geometry(path);
    if let Some(coeffs) = scenario.transform {
        engine.set_transform_source(Affine::new(coeffs));
    }
    for def in &scenario.layers {
        let layer = def
            .compile()
            .with_context(|| format!("compile layer '{}'", def.id))?;
        engine.register_layer(layer, def.layout)?;
    }

    let engine = Rc::new(RefCell::new(engine));
    let records: Rc<RefCell<Vec<Record>>> = Rc::new(RefCell::new(Vec::new()));
    let mut segment_subs = {
        let records = Rc::clone(&records);
        engine
            .borrow()
            .subscribe_all_segments(move |e| records.borrow_mut().push(Record::Segment(e.clone())))
    };
    let mut state_sub = {
        let records = Rc::clone(&records);
        engine
            .borrow()
            .subscribe(move |s| records.borrow_mut().push(Record::State(*s)))
    };

    let scheduler = Rc::new(ManualFrameScheduler::new());
    let frame_loop = FrameLoop::new(Rc::clone(&engine), scheduler.clone());
    frame_loop.start();

    let mut out = open_output(args.out.as_deref())?;
    let frame_secs = 1.0 / args.fps;
    for (frame, offset) in scenario.scroll.iter().enumerate() {
        match offset {
            Some(offset) => scroll.set(ScrollMetrics {
                scroll_offset: *offset,
                cross_extent: scenario.cross_extent,
                content_extent: scenario.content_extent,
                viewport_extent: scenario.viewport_extent,
            }),
            None => scroll.clear(),
        }
        let now = Duration::from_secs_f64(frame as f64 * frame_secs);
        scheduler.run_frame(now);

        let time_ms = now.as_secs_f64() * 1000.0;
        for record in records.borrow_mut().drain(..) {
            let line = match record {
                Record::Segment(event) => {
                    json!({ "frame": frame, "time_ms": time_ms, "segment": event })
                }
                Record::State(state) => {
                    let layers: serde_json::Map<String, serde_json::Value> = engine
                        .borrow()
                        .parallax()
                        .transforms()
                        .map(|(id, t)| serde_json::to_value(t).map(|v| (id.to_owned(), v)))
                        .collect::<serde_json::Result<_>>()?;
                    json!({ "frame": frame, "time_ms": time_ms, "state": state, "layers": layers })
                }
            };
            serde_json::to_writer(&mut out, &line)?;
            out.write_all(b"\n")?;
        }
    }

    frame_loop.stop();
    segment_subs.unsubscribe();
    state_sub.unsubscribe();
    out.flush()?;
    tracing::info!(frames = scenario.scroll.len(), "simulation finished");
    Ok(())
}

fn cmd_ease(args: EaseArgs) -> anyhow::Result<()> {
    let mut out = open_output(None)?;
    if args.list {
        for e in Ease::ALL {
            writeln!(out, "{}", e.name())?;
        }
        for preset in ["ease", "ease_in", "ease_out", "ease_in_out"] {
            writeln!(out, "{preset}")?;
        }
        out.flush()?;
        return Ok(());
    }

    let name = args.name.as_deref().unwrap_or_default();
    let easing = Easing::named(name)?;
    if args.samples < 2 {
        anyhow::bail!("--samples must be at least 2, got {}", args.samples);
    }
    let last = (args.samples - 1) as f64;
    for i in 0..args.samples {
        let t = i as f64 / last;
        serde_json::to_writer(&mut out, &json!({ "t": t, "value": easing.evaluate(t) }))?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
