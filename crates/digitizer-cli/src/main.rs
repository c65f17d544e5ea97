// File: crates/digitizer-cli/src/main.rs
// Summary: `digitize` CLI; calibrates an image from a JSON document and extracts curve points to CSV.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use digitizer_core::{
    compute_grid_lines, AxisId, Calibration, ConnectAs, CoordSystem, Curve, DigitizerConfig, FilterMode,
    FilterSettings, GraphPoint, GridLineSettings, Histogram, MatchStep, Point2, PointMatchSession, SourceImage,
};
use digitizer_core::filter::estimate_background;

#[derive(Parser)]
#[command(name = "digitize")]
#[command(about = "Extract numeric data points from images of plotted graphs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace the stroke under a seed pixel and export its points.
    Trace(TraceArgs),

    /// Collect every marker similar to the one under a sample pixel.
    Match(MatchArgs),

    /// Print the filter-metric histogram of an image.
    Histogram {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, value_enum, default_value_t = ModeArg::Intensity)]
        mode: ModeArg,
        /// Bucket count (defaults to the config value).
        #[arg(long)]
        buckets: Option<usize>,
    },

    /// Print the initial grid lines for a calibration.
    Grid {
        #[arg(long)]
        calibration: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },

    /// Convert one position between screen and graph coordinates.
    Convert {
        #[arg(long)]
        calibration: PathBuf,
        /// Screen position "X,Y" in pixels.
        #[arg(long, value_parser = parse_pair, conflicts_with = "graph")]
        screen: Option<(f64, f64)>,
        /// Graph position "X,Y" (theta,radius in polar mode).
        #[arg(long, value_parser = parse_pair)]
        graph: Option<(f64, f64)>,
    },
}

#[derive(Debug, Clone, Args)]
struct CommonArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Calibration document (JSON): settings plus axis points.
    #[arg(long)]
    calibration: PathBuf,

    /// Optional algorithm settings (JSON); missing fields take defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Filter metric used to separate the curve from the background.
    #[arg(long, value_enum, default_value_t = ModeArg::Intensity)]
    mode: ModeArg,

    /// Lower edge of the filter band (defaults per mode).
    #[arg(long)]
    low: Option<f64>,

    /// Upper edge of the filter band (defaults per mode).
    #[arg(long)]
    high: Option<f64>,

    /// Output CSV path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct TraceArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Seed pixel "X,Y" on the stroke.
    #[arg(long, value_parser = parse_pair)]
    seed: (f64, f64),

    #[arg(long, value_enum, default_value_t = ConnectArg::FunctionSmooth)]
    connect: ConnectArg,
}

#[derive(Debug, Clone, Args)]
struct MatchArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Pixel "X,Y" on the sample marker.
    #[arg(long, value_parser = parse_pair)]
    sample: (f64, f64),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Intensity,
    Hue,
    Saturation,
    Value,
    Foreground,
}

impl From<ModeArg> for FilterMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Intensity => FilterMode::Intensity,
            ModeArg::Hue => FilterMode::Hue,
            ModeArg::Saturation => FilterMode::Saturation,
            ModeArg::Value => FilterMode::Value,
            ModeArg::Foreground => FilterMode::Foreground,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConnectArg {
    FunctionSmooth,
    FunctionStraight,
    RelationSmooth,
    RelationStraight,
}

impl From<ConnectArg> for ConnectAs {
    fn from(c: ConnectArg) -> Self {
        match c {
            ConnectArg::FunctionSmooth => ConnectAs::FunctionSmooth,
            ConnectArg::FunctionStraight => ConnectAs::FunctionStraight,
            ConnectArg::RelationSmooth => ConnectAs::RelationSmooth,
            ConnectArg::RelationStraight => ConnectAs::RelationStraight,
        }
    }
}

fn parse_pair(s: &str) -> std::result::Result<(f64, f64), String> {
    let (a, b) = s.split_once(',').ok_or_else(|| format!("expected X,Y but got '{s}'"))?;
    let x = a.trim().parse::<f64>().map_err(|e| format!("bad X in '{s}': {e}"))?;
    let y = b.trim().parse::<f64>().map_err(|e| format!("bad Y in '{s}': {e}"))?;
    Ok((x, y))
}

fn to_pixel((x, y): (f64, f64)) -> Result<(u32, u32)> {
    if x < 0.0 || y < 0.0 {
        anyhow::bail!("pixel ({x}, {y}) is outside the image");
    }
    Ok((x.round() as u32, y.round() as u32))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Trace(args) => run_trace(&args),
        Commands::Match(args) => run_match(&args),
        Commands::Histogram { image, mode, buckets } => run_histogram(&image, mode, buckets),
        Commands::Grid { calibration, width, height } => run_grid(&calibration, width, height),
        Commands::Convert { calibration, screen, graph } => run_convert(&calibration, screen, graph),
    }
}

fn load_calibration(path: &Path) -> Result<CoordSystem> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read calibration '{}'", path.display()))?;
    let cal: Calibration = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse calibration '{}'", path.display()))?;
    let coords = CoordSystem::from_calibration(&cal).context("invalid calibration")?;
    coords.transform().context("calibration is incomplete")?;
    Ok(coords)
}

fn load_config(path: Option<&Path>) -> Result<DigitizerConfig> {
    match path {
        Some(p) => DigitizerConfig::from_json_file(p)
            .with_context(|| format!("failed to load config '{}'", p.display())),
        None => Ok(DigitizerConfig::default()),
    }
}

fn load_image(path: &Path) -> Result<SourceImage> {
    let img = image::open(path)
        .with_context(|| format!("failed to open image '{}'", path.display()))?
        .to_rgb8();
    tracing::info!(width = img.width(), height = img.height(), "image loaded");
    Ok(SourceImage::new(img))
}

fn filter_settings(args: &CommonArgs, image: &SourceImage) -> FilterSettings {
    let mode = FilterMode::from(args.mode);
    let mut s = FilterSettings::for_mode(mode);
    if matches!(mode, FilterMode::Foreground) {
        s = s.with_background(estimate_background(image.rgb()));
    }
    s.with_band(args.low.unwrap_or(s.low), args.high.unwrap_or(s.high))
}

/// Loads everything a point-extraction command needs; the curve's mask cache is primed.
fn prepare(args: &CommonArgs, connect_as: ConnectAs) -> Result<(CoordSystem, DigitizerConfig, SourceImage, Curve)> {
    let coords = load_calibration(&args.calibration)?;
    let cfg = load_config(args.config.as_deref())?;
    let image = load_image(&args.image)?;
    let mut curve = Curve::new("curve", connect_as);
    curve.filter_mut().set_settings(filter_settings(args, &image))?;

    if cfg.grid_removal.is_active() {
        let transform = coords.transform()?;
        let mut grid = GridLineSettings::initial(transform, image.width(), image.height());
        grid.max_lines = cfg.max_grid_lines;
        let lines = compute_grid_lines(transform, &grid, image.width(), image.height())?;
        tracing::info!(lines = lines.lines.len(), "removing grid lines from mask");
        curve.filter_mut().set_grid_removal(cfg.grid_removal, lines.lines);
    }
    Ok((coords, cfg, image, curve))
}

fn run_trace(args: &TraceArgs) -> Result<()> {
    let (coords, cfg, image, mut curve) = prepare(&args.common, args.connect.into())?;
    let mask = curve.filter_mut().mask(&image);
    let seed = to_pixel(args.seed)?;
    let points = cfg.tracer().trace(&mask, seed).context("segment fill failed")?;
    if points.is_empty() {
        println!("Segment under {seed:?} is shorter than the minimum length; nothing written");
        return Ok(());
    }
    cfg.orderer().insert_all(&mut curve, &points, &coords)?;
    write_curve_csv(&args.common.out, &curve, &coords)?;
    println!("Wrote {} points to {}", curve.len(), args.common.out.display());
    Ok(())
}

fn run_match(args: &MatchArgs) -> Result<()> {
    let (coords, cfg, image, mut curve) = prepare(&args.common, ConnectAs::FunctionSmooth)?;
    let mask = curve.filter_mut().mask(&image);
    let sample = to_pixel(args.sample)?;
    let mut session = PointMatchSession::start(mask, sample, cfg.point_match).context("point match failed")?;
    let t = session.template();
    println!("Template: {} px, {}x{} box", t.pixel_count, t.bbox.width(), t.bbox.height());

    while let MatchStep::Candidate(_) = session.next() {
        session.accept();
    }
    cfg.orderer().insert_all(&mut curve, session.accepted(), &coords)?;
    write_curve_csv(&args.common.out, &curve, &coords)?;
    println!("Wrote {} points to {}", curve.len(), args.common.out.display());
    Ok(())
}

fn write_curve_csv(path: &Path, curve: &Curve, coords: &CoordSystem) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let transform = coords.transform()?;
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("failed to create '{}'", path.display()))?;
    wtr.write_record(["x", "y", "screen_x", "screen_y"])?;
    for p in curve.points() {
        let (x, y) = coords.settings().format(p.graph(transform));
        let s = p.screen();
        wtr.write_record([x, y, format!("{}", s.x), format!("{}", s.y)])?;
    }
    wtr.flush()?;
    Ok(())
}

fn run_histogram(path: &Path, mode: ModeArg, buckets: Option<usize>) -> Result<()> {
    let image = load_image(path)?;
    let mode = FilterMode::from(mode);
    let mut settings = FilterSettings::for_mode(mode);
    if matches!(mode, FilterMode::Foreground) {
        settings = settings.with_background(estimate_background(image.rgb()));
    }
    let buckets = buckets.unwrap_or(DigitizerConfig::default().histogram_buckets);
    let h = Histogram::compute(image.rgb(), &settings, buckets);
    let peak = h.peak().max(1);
    println!("{:?} histogram over [{:.2}, {:.2}], {} pixels", h.mode, h.min, h.max, h.total());
    for (i, &count) in h.counts.iter().enumerate() {
        let bar = "#".repeat((count as usize * 50).div_ceil(peak as usize));
        println!("{:>9.2} {:>9} {}", h.bucket_start(i), count, bar);
    }
    Ok(())
}

fn run_grid(calibration: &Path, width: u32, height: u32) -> Result<()> {
    let coords = load_calibration(calibration)?;
    let transform = coords.transform()?;
    let settings = GridLineSettings::initial(transform, width, height);
    let set = compute_grid_lines(transform, &settings, width, height)?;
    if set.truncated {
        println!("(grid truncated to {} lines per axis)", settings.max_lines);
    }
    for axis in [AxisId::X, AxisId::Y] {
        for line in set.axis_lines(axis) {
            let (Some(first), Some(last)) = (line.path.first(), line.path.last()) else { continue };
            println!(
                "{axis} = {:<12} ({:.1}, {:.1}) -> ({:.1}, {:.1})  [{} pts]",
                line.value,
                first.x,
                first.y,
                last.x,
                last.y,
                line.path.len()
            );
        }
    }
    Ok(())
}

fn run_convert(calibration: &Path, screen: Option<(f64, f64)>, graph: Option<(f64, f64)>) -> Result<()> {
    let coords = load_calibration(calibration)?;
    let transform = coords.transform()?;
    match (screen, graph) {
        (Some((x, y)), _) => {
            let g = transform.to_graph(Point2::new(x, y));
            let (gx, gy) = coords.settings().format(g);
            println!("screen ({x}, {y}) -> graph ({gx}, {gy})");
        }
        (None, Some((x, y))) => {
            let s = transform.to_screen(GraphPoint::new(x, y))?;
            println!("graph ({x}, {y}) -> screen ({:.3}, {:.3})", s.x, s.y);
        }
        (None, None) => anyhow::bail!("pass --screen X,Y or --graph X,Y"),
    }
    Ok(())
}
