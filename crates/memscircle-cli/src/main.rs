//! memscircle CLI: circle center and radius estimation from the command line.

use clap::{Args, Parser, Subcommand, ValueEnum};
use memscircle::{
    CircleFitMethod, CircleResult, Configuration, EdgeDetectionMethod, FilterMethod,
    PipelineOutput, ThresholdingMethod,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "memscircle")]
#[command(about = "Estimate the center and radius of a circular feature in a grayscale image")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a circle to an image.
    Detect(CliDetectArgs),

    /// Print the effective configuration as settings key/value lines.
    Config(CliConfigArgs),
}

#[derive(Debug, Clone, Args)]
struct CliDetectArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Path to write the result (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Directory for per-stage PNG snapshots.
    #[arg(long)]
    stages_dir: Option<PathBuf>,

    #[command(flatten)]
    overrides: CliConfigArgs,
}

#[derive(Debug, Clone, Args, Default)]
struct CliConfigArgs {
    /// Base configuration (JSON). Missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Smoothing filter.
    #[arg(long, value_enum)]
    filter: Option<FilterArg>,

    /// Thresholding method, applied to the image and to the edge map.
    #[arg(long, value_enum)]
    threshold: Option<ThresholdArg>,

    /// Gradient operator.
    #[arg(long, value_enum)]
    edges: Option<EdgesArg>,

    /// Circle fit method.
    #[arg(long, value_enum)]
    fit: Option<FitArg>,

    /// Filter half-width in pixels (0 disables filtering).
    #[arg(long)]
    radius: Option<u32>,

    /// Gaussian standard deviation in pixels.
    #[arg(long)]
    sigma: Option<f64>,

    /// P-tile fraction in [0, 1].
    #[arg(long)]
    p_tile: Option<f64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    Gaussian,
    Mean,
    Median,
}

impl FilterArg {
    fn to_core(self) -> FilterMethod {
        match self {
            Self::Gaussian => FilterMethod::Gaussian,
            Self::Mean => FilterMethod::Mean,
            Self::Median => FilterMethod::Median,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ThresholdArg {
    Cluster,
    PTile,
}

impl ThresholdArg {
    fn to_core(self) -> ThresholdingMethod {
        match self {
            Self::Cluster => ThresholdingMethod::Cluster,
            Self::PTile => ThresholdingMethod::PTile,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EdgesArg {
    Sobel,
    Prewitt,
    Scharr,
}

impl EdgesArg {
    fn to_core(self) -> EdgeDetectionMethod {
        match self {
            Self::Sobel => EdgeDetectionMethod::Sobel,
            Self::Prewitt => EdgeDetectionMethod::Prewitt,
            Self::Scharr => EdgeDetectionMethod::Scharr,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FitArg {
    SimpleAlgebraic,
    Geometric,
}

impl FitArg {
    fn to_core(self) -> CircleFitMethod {
        match self {
            Self::SimpleAlgebraic => CircleFitMethod::SimpleAlgebraic,
            Self::Geometric => CircleFitMethod::Geometric,
        }
    }
}

impl CliConfigArgs {
    /// Base configuration (file or defaults) with command-line overrides applied.
    fn to_config(&self) -> CliResult<Configuration> {
        let mut config = match &self.config {
            Some(path) => Configuration::from_json_file(path).map_err(|e| -> CliError {
                format!("Failed to load config {}: {}", path.display(), e).into()
            })?,
            None => Configuration::default(),
        };
        if let Some(f) = self.filter {
            config = config.with_filter_method(f.to_core());
        }
        if let Some(t) = self.threshold {
            config = config.with_thresholding_method(t.to_core());
        }
        if let Some(e) = self.edges {
            config = config.with_edge_detection_method(e.to_core());
        }
        if let Some(m) = self.fit {
            config = config.with_circle_fit_method(m.to_core());
        }
        if let Some(r) = self.radius {
            config = config.with_filter_radius(r);
        }
        if let Some(s) = self.sigma {
            config = config.with_gaussian_sigma(s);
        }
        if let Some(p) = self.p_tile {
            config = config.with_p_tile_value(p);
        }
        config.validate()?;
        Ok(config)
    }
}

/// JSON document written by `detect`.
#[derive(Debug, Serialize)]
struct DetectReport {
    image_size: [u32; 2],
    config: Configuration,
    circle: CircleResult,
    n_points: usize,
    rms_residual: f64,
}

impl DetectReport {
    fn new(config: Configuration, output: &PipelineOutput) -> Self {
        Self {
            image_size: output.image_size(),
            config,
            circle: output.circle,
            n_points: output.stages.points.len(),
            rms_residual: output.rms_residual(),
        }
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Config(args) => run_config(&args),
    }
}

// ── config ─────────────────────────────────────────────────────────────

fn run_config(args: &CliConfigArgs) -> CliResult<()> {
    let config = args.to_config()?;
    for (key, value) in config.to_settings() {
        println!("{}={}", key, value);
    }
    Ok(())
}

// ── detect ─────────────────────────────────────────────────────────────

fn run_detect(args: &CliDetectArgs) -> CliResult<()> {
    tracing::info!("Loading image: {}", args.image.display());

    let img = image::open(&args.image).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", args.image.display(), e).into()
    })?;
    let config = args.overrides.to_config()?;
    tracing::info!("{}", config);

    let output = memscircle::pipeline::run_dynamic(&img, &config)?;
    tracing::info!(
        "Circle: center=({:.3}, {:.3}) radius={:.3}",
        output.circle.center[0],
        output.circle.center[1],
        output.circle.radius,
    );

    if let Some(dir) = &args.stages_dir {
        write_stages(dir, &output)?;
    }

    let report = DetectReport::new(config, &output);
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Results written to {}", args.out.display());

    Ok(())
}

fn write_stages(dir: &Path, output: &PipelineOutput) -> CliResult<()> {
    std::fs::create_dir_all(dir)?;
    let stages = &output.stages;
    for (name, img) in [
        ("filtered.png", &stages.filtered),
        ("binary.png", &stages.binary),
        ("edges.png", &stages.edges),
        ("edge_mask.png", &stages.edge_mask),
    ] {
        let path = dir.join(name);
        img.save(&path).map_err(|e| -> CliError {
            format!("Failed to write {}: {}", path.display(), e).into()
        })?;
    }
    tracing::info!("Stage images written to {}", dir.display());
    Ok(())
}
