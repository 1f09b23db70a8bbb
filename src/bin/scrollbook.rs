use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use scrollbook::{Engine, EngineConfig, FrameFetcher, FsFetcher, SyntheticFetcher, Viewport};

#[derive(Parser, Debug)]
#[command(name = "scrollbook", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite the frame for a given scroll position and write it as a PNG.
    Frame(FrameArgs),
    /// Drive a scripted scroll trace through the engine and print stats.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Engine configuration JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the frame sequence. Synthetic frames when omitted.
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Scroll offset in pixels.
    #[arg(long, default_value_t = 0.0)]
    offset: f64,

    /// Maximum scrollable extent in pixels.
    #[arg(long, default_value_t = 1000.0)]
    extent: f64,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Engine configuration JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the frame sequence. Synthetic frames when omitted.
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Number of ticks to run (one tick per nominal 60Hz refresh).
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Scrollable extent the trace ramps across.
    #[arg(long, default_value_t = 4000.0)]
    extent: f64,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
    let cfg: EngineConfig =
        serde_json::from_reader(BufReader::new(f)).context("parse engine config JSON")?;
    Ok(cfg)
}

fn build_engine(
    config: Option<&Path>,
    frames_dir: Option<&Path>,
    viewport: Viewport,
) -> anyhow::Result<(Engine, bool)> {
    let mut cfg = read_config(config)?;
    let from_disk = frames_dir.is_some() || config.is_some();
    if let Some(dir) = frames_dir {
        cfg.sequence.base_dir = dir.to_path_buf();
    }
    let fetcher: Box<dyn FrameFetcher> = if from_disk {
        Box::new(FsFetcher)
    } else {
        let (w, h) = viewport.physical(cfg.compositor.max_pixel_ratio);
        Box::new(SyntheticFetcher::new(w, h))
    };
    let engine = Engine::new(cfg, fetcher, viewport)?;
    Ok((engine, from_disk))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let viewport = Viewport::new(args.width, args.height, args.pixel_ratio);
    let (mut engine, from_disk) =
        build_engine(args.config.as_deref(), args.frames_dir.as_deref(), viewport)?;

    engine.on_scroll(args.offset, args.extent);
    let target = engine.scroll_state().target_frame;

    // Tick until the smoothed frame has converged onto the target and it has
    // actually been presented. Disk decodes land asynchronously, so give the
    // workers wall time between ticks.
    let mut settled = false;
    for i in 0..2_000u64 {
        let report = engine.tick(Duration::from_millis(i * 16));
        if report.displayed == Some(target) && engine.scroll_state().smooth_frame == target as f64 {
            settled = true;
            break;
        }
        if from_disk {
            std::thread::sleep(Duration::from_millis(2));
        }
    }
    if !settled {
        anyhow::bail!("playback did not settle on frame {target}; are the assets readable?");
    }

    let (w, h, pixels) = engine.frame_buffer();
    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        pixels,
        w,
        h,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let viewport = Viewport::new(args.width, args.height, args.pixel_ratio);
    let (mut engine, from_disk) =
        build_engine(args.config.as_deref(), args.frames_dir.as_deref(), viewport)?;

    let ticks = args.ticks.max(1);
    let mut last = None;
    for i in 0..ticks {
        // Linear ramp down the page, with a gentle cursor sweep on top.
        let t = i as f64 / (ticks - 1).max(1) as f64;
        engine.on_scroll(t * args.extent, args.extent);
        engine.on_cursor((t * std::f64::consts::TAU).sin(), 0.25);
        last = Some(engine.tick(Duration::from_millis(i * 16)));
        if from_disk {
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    let stats = engine.stats();
    let readiness = last.map(|r| r.readiness).unwrap_or_default();
    eprintln!(
        "ticks {}  draws {}  elided {}  frames ready {}/{}  reveal {}  coverage complete {}",
        stats.ticks,
        stats.draws,
        stats.draws_elided,
        engine.store().ready_count(),
        engine.store().frame_count(),
        readiness.reveal,
        engine.loading_complete(),
    );
    Ok(())
}
