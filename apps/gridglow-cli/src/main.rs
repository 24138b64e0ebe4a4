use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gridglow_common::{GridConfig, Rgba, Viewport};
use gridglow_raster::PixelSurface;
use gridglow_render::{
    AnimationLoop, FrameStats, GridRenderer, ManualClock, RecordingSurface, Surface,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridglow-cli", about = "Headless tool for the pointer-lit grid")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Grid config file (YAML, or JSON with a .json extension)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the effective config
    Info,
    /// Print the effective config
    Config {
        #[arg(long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },
    /// Run frames against a recording surface and report what was drawn
    Inspect {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Render frames in software and write the last one as PNG
    Snapshot {
        #[command(flatten)]
        run: RunArgs,
        /// Output file
        #[arg(short, long)]
        out: PathBuf,
        /// Flatten onto this color instead of keeping transparency
        #[arg(long, value_parser = parse_color)]
        backdrop: Option<Rgba>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

#[derive(Args, Clone)]
struct RunArgs {
    #[arg(long, default_value_t = 800)]
    width: u32,
    #[arg(long, default_value_t = 600)]
    height: u32,
    /// Pointer position as X,Y in pixels
    #[arg(long, default_value = "400,300", value_parser = parse_point)]
    pointer: Point,
    /// Frames to run; the glow settles toward the pointer over time
    #[arg(long, default_value_t = 60)]
    frames: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f32,
    y: f32,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let coord = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|e| format!("bad coordinate {v:?}: {e}"))
    };
    Ok(Point {
        x: coord(x)?,
        y: coord(y)?,
    })
}

fn parse_color(s: &str) -> Result<Rgba, String> {
    Rgba::from_hex(s).ok_or_else(|| format!("expected #rrggbb, got {s:?}"))
}

/// Drive `frames` frames through an animation loop onto `surface`.
fn run_frames<S: Surface>(
    config: &GridConfig,
    run: &RunArgs,
    surface: &mut S,
) -> anyhow::Result<Option<FrameStats>> {
    let viewport = Viewport::new(run.width, run.height);
    let mut anim = AnimationLoop::new(GridRenderer::with_config(config.clone(), viewport)?);
    anim.renderer_mut().on_resize(viewport, surface);
    anim.renderer_mut()
        .on_pointer_move(run.pointer.x, run.pointer.y);

    let mut clock = ManualClock::new();
    anim.start(&mut clock);
    let stats = clock.run(&mut anim, surface, run.frames);
    anim.stop(&mut clock);
    tracing::debug!(frames = anim.frames_rendered(), "run finished");
    Ok(stats)
}

fn write_snapshot(
    config: &GridConfig,
    run: &RunArgs,
    out: &Path,
    backdrop: Option<Rgba>,
) -> anyhow::Result<Option<FrameStats>> {
    if run.width == 0 || run.height == 0 {
        bail!("snapshot needs a non-empty viewport, got {}x{}", run.width, run.height);
    }
    let mut surface = PixelSurface::new(Viewport::new(run.width, run.height));
    let stats = run_frames(config, run, &mut surface)?;
    surface
        .write_png(out, backdrop)
        .with_context(|| format!("writing {}", out.display()))?;
    Ok(stats)
}

fn print_stats(stats: &FrameStats) {
    println!("vertices:      {}", stats.vertices);
    println!("segments:      {}", stats.segments);
    println!("lit segments:  {}", stats.lit_segments);
    println!("filled quads:  {}", stats.filled_quads);
    println!("peak lift:     {:.2}", stats.peak_lift);
    println!(
        "glow center:   ({:.1}, {:.1})",
        stats.glow_center.x, stats.glow_center.y
    );
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &cli.config {
        Some(path) => GridConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GridConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("gridglow-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", gridglow_common::crate_info());
            println!("render: {}", gridglow_render::crate_info());
            println!("raster: {}", gridglow_raster::crate_info());
            println!(
                "grid: spacing={} radius={} lift={} smoothing={} color={}",
                config.grid_size,
                config.flashlight_radius,
                config.max_lift,
                config.smoothing,
                config.primary().css()
            );
        }
        Commands::Config { format } => {
            let text = match format {
                Format::Yaml => config.to_yaml_string()?,
                Format::Json => config.to_json_string()?,
            };
            println!("{}", text.trim_end());
        }
        Commands::Inspect { run } => {
            let mut surface = RecordingSurface::new(Viewport::new(run.width, run.height));
            match run_frames(&config, &run, &mut surface)? {
                Some(stats) => {
                    println!(
                        "Inspect: {}x{}, pointer=({}, {}), frames={}",
                        run.width, run.height, run.pointer.x, run.pointer.y, run.frames
                    );
                    print_stats(&stats);
                    for kind in ["clear_rect", "fill_rect", "stroke_line", "fill_polygon"] {
                        println!("{kind:<14} {}", surface.count(kind));
                    }
                }
                None => println!("No frames rendered"),
            }
        }
        Commands::Snapshot {
            run,
            out,
            backdrop,
        } => {
            let stats = write_snapshot(&config, &run, &out, backdrop)?;
            println!("Snapshot written to {}", out.display());
            if let Some(stats) = stats {
                print_stats(&stats);
            }
        }
    }

    Ok(())
}
