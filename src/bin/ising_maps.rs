// src/bin/ising_maps.rs - Single-temperature run exporting a snapshot per sweep

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ising2d::simulation::{run_sweeps, SimulationConfig};
use ising2d::snapshot::{pad_width, snapshot_path, write_snapshot, SeriesWriter};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
struct Cli {
    /// Lattice edge length
    #[arg(long, default_value = "150")]
    size: usize,

    /// Number of sweeps
    #[arg(long, default_value = "100000")]
    sweeps: usize,

    /// Temperature
    #[arg(long, default_value = "0.1")]
    temperature: f64,

    /// Probability of an up spin in the initial grid
    #[arg(long, default_value = "0.45")]
    probability: f64,

    /// Snapshot file prefix
    #[arg(long, default_value = "ising_2d_map")]
    prefix: String,

    /// Output directory (defaults to ising2d_results_<size>x<size>_T<temperature>)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Write a snapshot every this many sweeps
    #[arg(long, default_value = "1")]
    snapshot_every: u64,

    /// Random seed
    #[arg(long, default_value = "42")]
    seed: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let args = Cli::parse();
    let cfg = SimulationConfig {
        size: args.size,
        probability: args.probability,
        temperature: args.temperature,
        sweeps: args.sweeps,
        seed: args.seed,
        ..SimulationConfig::default()
    };
    let out_dir = args.out_dir.unwrap_or_else(|| {
        PathBuf::from(format!(
            "ising2d_results_{0}x{0}_T{1}",
            cfg.size, cfg.temperature
        ))
    });
    fs::create_dir_all(&out_dir)?;
    info!(out_dir = %out_dir.display(), "results folder");

    let mut rng = ChaCha20Rng::seed_from_u64(cfg.seed);
    let mut lattice = cfg.build_lattice(&mut rng)?;
    // Iterations run 0..=sweeps; pad so the last one still sorts last.
    let width = pad_width(cfg.sweeps as u64);
    write_snapshot(&lattice, &snapshot_path(&out_dir, &args.prefix, 0, width))?;

    let mut series = SeriesWriter::create(&out_dir.join(format!("{}.csv", args.prefix)))?;
    let every = args.snapshot_every.max(1);

    let bar = ProgressBar::new(cfg.sweeps as u64);
    bar.set_style(ProgressStyle::with_template(
        " {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}] {msg}",
    )?);

    run_sweeps(&mut lattice, cfg.sweeps, &mut rng, |lattice, m| {
        series.write(m)?;
        if m.sweep % every == 0 {
            write_snapshot(lattice, &snapshot_path(&out_dir, &args.prefix, m.sweep, width))?;
        }
        bar.set_message(format!("M = {}", m.magnetization));
        bar.inc(1);
        Ok(())
    })?;
    bar.finish();
    series.finish()?;

    println!("Final energy:        {}", lattice.total_energy());
    println!("Final magnetization: {}", lattice.magnetization());
    println!("Snapshots stored in {}", out_dir.display());
    Ok(())
}
