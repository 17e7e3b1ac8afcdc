use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use voxel_geodesic::voxel_grid::info as build_info;
use voxel_geodesic::{CombineRule, CostField, CostPolicy, GeodesicSearch, Grid3D, Volume3D, Voxel};

/// Find the minimum-cost path between two voxels of a 3D mask and write it
/// out as a volume of spheres.
#[derive(Parser, Debug)]
#[command(name = "voxel_geodesic")]
#[command(version, about, long_about = None)]
struct Cli {
	/// Cost mask in MRC format (.mrc or .mrc.gz)
	#[arg(long, short = 'm')]
	mask: PathBuf,

	/// Start voxel as i,j,k
	#[arg(long, short = 's')]
	start: Voxel,

	/// Goal voxel as i,j,k
	#[arg(long, short = 'g')]
	goal: Voxel,

	/// Output MRC file [default: <mask>_geodesic.mrc]
	#[arg(long, short = 'o')]
	output: Option<PathBuf>,

	/// Radius, in voxels, of the sphere stamped around each path voxel
	#[arg(long, short = 'r', default_value_t = 2.0, value_parser = parse_radius)]
	radius: f64,

	/// Mask values at or below this are impassable
	#[arg(long, short = 't', default_value_t = 0.0)]
	threshold: f64,

	/// How neighbouring voxel costs combine into an edge cost (mean or max)
	#[arg(long, default_value_t = CombineRule::Mean)]
	combine: CombineRule,

	/// Print the path voxels to stdout, one "i j k" line each
	#[arg(long)]
	print_path: bool,

	/// Hide the progress bar
	#[arg(long, short = 'q')]
	quiet: bool,

	/// Increase log verbosity (-v debug, -vv trace)
	#[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
	verbose: u8,
}

fn parse_radius(text: &str) -> Result<f64, String> {
	let radius: f64 = text.parse().map_err(|e| format!("{e}"))?;
	if !radius.is_finite() || radius < 0.0 {
		return Err(format!("radius must be a finite number >= 0, got {text}"));
	}
	Ok(radius)
}

/// Reject spheres wider than the volume itself.
fn check_radius(radius: f64, dims: [usize; 3]) -> Result<()> {
	let largest = dims.into_iter().max().unwrap_or(0);
	if radius > largest as f64 {
		bail!("sphere radius {radius} exceeds the largest volume dimension ({largest} voxels)");
	}
	Ok(())
}

fn init_tracing(verbose: u8) {
	let level = match verbose {
		0 => "info",
		1 => "debug",
		_ => "trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.try_init();
}

/// `brain.mrc.gz` -> `brain_geodesic.mrc`, next to the input.
fn default_output(mask: &Path) -> PathBuf {
	let name = mask
		.file_name()
		.and_then(|n| n.to_str())
		.unwrap_or("mask");
	let lower = name.to_ascii_lowercase();
	let stem_len = [".mrc.gz", ".map.gz", ".gz", ".mrc", ".map"]
		.iter()
		.find(|ext| lower.ends_with(*ext))
		.map_or(name.len(), |ext| name.len() - ext.len());
	mask.with_file_name(format!("{}_geodesic.mrc", &name[..stem_len]))
}

fn print_path(path: &[Voxel]) -> Result<()> {
	let stdout = io::stdout();
	let mut out = BufWriter::new(stdout.lock());
	for voxel in path {
		writeln!(out, "{} {} {}", voxel.i, voxel.j, voxel.k)?;
	}
	out.flush()?;
	Ok(())
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	init_tracing(cli.verbose);
	build_info::log_build_info();

	let preprocess_start = Instant::now();
	let volume = Volume3D::read_mrc_file(&cli.mask)?;
	check_radius(cli.radius, volume.dims())?;
	let policy = CostPolicy::default()
		.with_threshold(cli.threshold)
		.with_combine(cli.combine);
	let field = CostField::new(&volume, policy).context("invalid cost settings")?;
	info!(
		traversable = field.traversable_count(),
		total = volume.total_voxels,
		ms = preprocess_start.elapsed().as_secs_f64() * 1000.0,
		"preprocessing done"
	);

	let search_start = Instant::now();
	let path = GeodesicSearch::new(field)
		.find_path(cli.start, cli.goal)
		.with_context(|| format!("no geodesic path from {} to {}", cli.start, cli.goal))?;
	info!(
		steps = path.steps(),
		cost = path.cost,
		explored = path.stats.finalized,
		seconds = search_start.elapsed().as_secs_f64(),
		"search done"
	);

	let postprocess_start = Instant::now();
	let output = cli.output.clone().unwrap_or_else(|| default_output(&cli.mask));
	let mut grid = Grid3D::matching(&volume);
	grid.report_memory();
	grid.rasterize_path(&path.voxels, cli.radius, !cli.quiet);
	grid.write_to_mrc_file(&output)?;
	info!(
		output = %output.display(),
		ms = postprocess_start.elapsed().as_secs_f64() * 1000.0,
		"postprocessing done"
	);

	if cli.print_path {
		print_path(&path.voxels)?;
	}
	Ok(())
}
