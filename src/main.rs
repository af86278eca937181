//! Temperature scan of the 2D Ising model: one independent lattice per
//! temperature, equilibrated then measured, results written as CSV.

use clap::Parser;
use csv::WriterBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use ising2d::observables::ThermoSummary;
use ising2d::IsingError;
use ising2d::simulation::{equilibrate_and_measure, SimulationConfig};
use ising2d::utils::rng::stream_rng;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

#[derive(Parser, Debug)]
struct Cli {
    /// Lattice edge length
    #[arg(long, default_value = "150")]
    size: usize,

    /// Lowest temperature
    #[arg(long, default_value = "0.1")]
    t_min: f64,

    /// Highest temperature
    #[arg(long, default_value = "1.0")]
    t_max: f64,

    /// Temperature step
    #[arg(long, default_value = "0.1")]
    t_step: f64,

    /// Probability of an up spin in the initial grid
    #[arg(long, default_value = "0.8")]
    probability: f64,

    /// Maximum equilibration sweeps per temperature
    #[arg(long, default_value = "20000")]
    sweeps: usize,

    /// Convergence threshold on acceptance ratio / relative energy change
    #[arg(long, default_value = "1e-6")]
    threshold: f64,

    /// Sweeps averaged after equilibration
    #[arg(long, default_value = "1000")]
    measure_sweeps: usize,

    /// Master seed; each temperature gets its own derived stream
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Output file (defaults to ising_2d_<size>_<size>.csv)
    #[arg(long)]
    output: Option<PathBuf>,
}

fn temperatures(t_min: f64, t_max: f64, t_step: f64) -> Vec<f64> {
    if t_step <= 0.0 || t_max < t_min {
        return vec![t_min];
    }
    let n = ((t_max - t_min) / t_step + 1e-9).floor() as usize + 1;
    (0..n).map(|i| t_min + i as f64 * t_step).collect()
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
    let base = SimulationConfig {
        size: args.size,
        probability: args.probability,
        sweeps: args.sweeps,
        convergence_threshold: args.threshold,
        measure_sweeps: args.measure_sweeps,
        seed: args.seed,
        ..SimulationConfig::default()
    };
    let temps = temperatures(args.t_min, args.t_max, args.t_step);
    info!(n_temperatures = temps.len(), config = ?base, "temperature scan");

    let bar = ProgressBar::new(temps.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        " {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}]",
    )?);

    let results: Mutex<Vec<ThermoSummary>> = Mutex::new(Vec::new());

    // Lattices are independent; each owns a stream derived from its index.
    temps
        .par_iter()
        .enumerate()
        .try_for_each(|(idx, &temperature)| -> ising2d::Result<()> {
            let cfg = SimulationConfig { temperature, ..base.clone() };
            let mut rng = stream_rng(cfg.seed, idx);
            let mut lattice = cfg.build_lattice(&mut rng)?;
            let summary = equilibrate_and_measure(&mut lattice, &cfg, &mut rng)?;

            results
                .lock()
                .map_err(|_| IsingError::InvalidState("results mutex poisoned".to_string()))?
                .push(summary);
            bar.println(format!("temperature: {temperature}"));
            bar.inc(1);
            Ok(())
        })?;
    bar.finish();

    // Sort for deterministic CSV order.
    let mut rows = results
        .into_inner()
        .map_err(|_| IsingError::InvalidState("results mutex poisoned".to_string()))?;
    rows.sort_by(|a, b| a.temperature.total_cmp(&b.temperature));

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("ising_2d_{0}_{0}.csv", args.size)));
    let mut wtr = WriterBuilder::new().from_path(&output)?;
    wtr.write_record([
        "temperature", "energy", "magnetization", "abs_magnetization",
        "specific_heat", "susceptibility", "binder_cumulant",
    ])?;
    for r in &rows {
        wtr.write_record(&[
            r.temperature.to_string(), r.energy.to_string(),
            r.magnetization.to_string(), r.abs_magnetization.to_string(),
            r.specific_heat.to_string(), r.susceptibility.to_string(),
            r.binder_cumulant.to_string(),
        ])?;
    }
    wtr.flush()?;
    println!("Scan complete → {}", output.display());
    Ok(())
}
