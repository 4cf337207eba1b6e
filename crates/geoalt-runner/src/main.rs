//! `geoalt`: build a terrain mesh for a bounding box from the IGN elevation service.

use clap::{Args, Parser, Subcommand};
use geoalt_runner::{build_terrain, plan_run, ConfigOverrides, RunConfig, RunnerError};
use geoalt_terrain::{BoundingBox, PRESETS};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "geoalt", version, about = "Terrain meshes from web elevation data")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch elevations and write the mesh
    Build(RunArgs),
    /// Show grid size and request lengths without fetching
    Plan(PlanArgs),
    /// List built-in areas
    Presets,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in area name (see `geoalt presets`)
    #[arg(long, conflicts_with = "north")]
    area: Option<String>,

    /// North edge latitude
    #[arg(long, allow_hyphen_values = true, requires_all = ["south", "east", "west"])]
    north: Option<f64>,

    /// South edge latitude
    #[arg(long, allow_hyphen_values = true, requires = "north")]
    south: Option<f64>,

    /// East edge longitude
    #[arg(long, allow_hyphen_values = true, requires = "north")]
    east: Option<f64>,

    /// West edge longitude
    #[arg(long, allow_hyphen_values = true, requires = "north")]
    west: Option<f64>,

    /// Target ground spacing in metres
    #[arg(long, conflicts_with = "steps")]
    spacing: Option<f64>,

    /// Fixed number of points per axis
    #[arg(long)]
    steps: Option<usize>,

    /// Elevation service URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Longest request accepted by the service, in bytes
    #[arg(long)]
    max_request_len: Option<usize>,

    /// Requests in flight at once (1 = sequential)
    #[arg(long)]
    concurrency: Option<usize>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// OBJ output path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON metadata output path
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Object name
    #[arg(long)]
    name: Option<String>,

    /// Disable smooth shading
    #[arg(long)]
    flat: bool,

    /// Do not print per-row progress
    #[arg(long)]
    no_progress: bool,
}

#[derive(Debug, Args)]
struct PlanArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn load_config(&self) -> Result<RunConfig, RunnerError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };

        let bounds = match (self.north, self.south, self.east, self.west) {
            (Some(north), Some(south), Some(east), Some(west)) => {
                Some(BoundingBox::new(north, south, east, west)?)
            }
            _ => None,
        };

        config.apply(ConfigOverrides {
            area: self.area.clone(),
            bounds,
            spacing_m: self.spacing,
            steps: self.steps,
            endpoint: self.endpoint.clone(),
            max_request_len: self.max_request_len,
            concurrency: self.concurrency,
            timeout_secs: self.timeout,
            output_path: self.output.clone(),
            metadata_path: self.metadata.clone(),
            name: self.name.clone(),
            flat: self.flat,
        });
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn plan(args: &PlanArgs) -> Result<(), RunnerError> {
    let config = args.run.load_config()?;
    let report = plan_run(&config)?;
    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }
    let plan = &report.plan;

    println!(
        "Grid: {} rows x {} cols ({} points, {} faces)",
        plan.rows,
        plan.cols,
        plan.point_count(),
        plan.face_count()
    );
    println!("Extent: {:.1}m x {:.1}m", plan.width, plan.height);
    println!("Spacing: {:.2}m x {:.2}m", plan.spacing_x, plan.spacing_y);
    println!(
        "Requests: {} (longest {} bytes, limit {})",
        report.requests, report.longest_request, report.max_request_len
    );
    if !report.fits() {
        warn!("Rows are too long for the service; lower --steps or raise --spacing");
    }
    Ok(())
}

fn build(args: &RunArgs) -> Result<(), RunnerError> {
    let config = args.load_config()?;

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    info!("Retrieving elevations from {}", config.service.endpoint);
    let surface = build_terrain(&config, cancel, !args.no_progress)?;
    info!(
        "Surface '{}': {} vertices, {} faces, accuracy min {:.2} / max {:.2} / mean {:.2}",
        surface.name,
        surface.mesh.vertices.len(),
        surface.mesh.faces.len(),
        surface.mesh.accuracy.min,
        surface.mesh.accuracy.max,
        surface.mesh.accuracy.mean
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Command::Build(args) => build(args),
        Command::Plan(args) => plan(args),
        Command::Presets => {
            for (name, bbox) in PRESETS {
                println!(
                    "{:<14} north={} south={} east={} west={}",
                    name, bbox.north, bbox.south, bbox.east, bbox.west
                );
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
