// simulation.rs - Driver loops around the Metropolis sweep

use crate::error::Result;
use crate::lattice::Lattice;
use crate::observables::{Measurement, ThermoAccumulator, ThermoSummary};
use rand::Rng;
use tracing::{debug, info};

/// Run-time configuration of one lattice run (single source of truth).
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub size: usize,
    /// Probability of an up spin when randomizing the initial grid.
    pub probability: f64,
    pub temperature: f64,
    /// Upper bound on sweeps.
    pub sweeps: usize,
    /// Early-stop threshold on acceptance ratio and relative energy change.
    /// Zero disables early stopping.
    pub convergence_threshold: f64,
    /// Sweeps averaged after equilibration when measuring.
    pub measure_sweeps: usize,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            size: 150,
            probability: 0.45,
            temperature: 0.1,
            sweeps: 100_000,
            convergence_threshold: 0.0,
            measure_sweeps: 0,
            seed: 0x1513_2D15,
        }
    }
}

impl SimulationConfig {
    /// Allocate, set the temperature and randomize a lattice per this config.
    pub fn build_lattice(&self, rng: &mut impl Rng) -> Result<Lattice> {
        let mut lattice = Lattice::new(self.size)?;
        lattice.set_temperature(self.temperature)?;
        lattice.randomize(self.probability, rng)?;
        Ok(lattice)
    }
}

/// How a convergence-terminated run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convergence {
    pub sweeps: usize,
    pub converged: bool,
    pub last: Measurement,
}

/// Run `n_sweeps` sweeps, handing every post-sweep state to `on_sweep`.
pub fn run_sweeps<R, F>(
    lattice: &mut Lattice,
    n_sweeps: usize,
    rng: &mut R,
    mut on_sweep: F,
) -> Result<()>
where
    R: Rng,
    F: FnMut(&Lattice, &Measurement) -> Result<()>,
{
    info!(
        size = lattice.size(),
        temperature = lattice.temperature(),
        n_sweeps,
        "starting sweeps"
    );
    for _ in 0..n_sweeps {
        let info = lattice.sweep(rng)?;
        let m = Measurement::of(lattice, info.accepted);
        on_sweep(lattice, &m)?;
    }
    info!(
        energy = lattice.total_energy(),
        magnetization = lattice.magnetization(),
        "sweeps finished"
    );
    Ok(())
}

/// Sweep until the fraction of flipped spins or the relative energy change
/// between consecutive sweeps drops below `threshold`, or `max_sweeps` is hit.
pub fn run_until_converged(
    lattice: &mut Lattice,
    max_sweeps: usize,
    threshold: f64,
    rng: &mut impl Rng,
) -> Result<Convergence> {
    let mut energy = lattice.total_energy();
    let mut last = Measurement::of(lattice, 0);

    for step in 1..=max_sweeps {
        let info = lattice.sweep(rng)?;
        last = Measurement::of(lattice, info.accepted);

        let ratio = info.acceptance_ratio();
        let rel_change = if energy != 0.0 {
            ((last.energy - energy) / energy).abs()
        } else {
            f64::INFINITY
        };
        if ratio < threshold || rel_change < threshold {
            debug!(
                sweeps = step,
                acceptance = ratio,
                rel_change,
                temperature = lattice.temperature(),
                "converged"
            );
            return Ok(Convergence { sweeps: step, converged: true, last });
        }
        energy = last.energy;
    }

    Ok(Convergence { sweeps: max_sweeps, converged: false, last })
}

/// Equilibrate with [`run_until_converged`] then average `measure_sweeps`
/// further sweeps. With no measurement window the final state alone is used.
pub fn equilibrate_and_measure(
    lattice: &mut Lattice,
    cfg: &SimulationConfig,
    rng: &mut impl Rng,
) -> Result<ThermoSummary> {
    let conv = run_until_converged(lattice, cfg.sweeps, cfg.convergence_threshold, rng)?;
    if !conv.converged {
        debug!(
            temperature = lattice.temperature(),
            sweeps = conv.sweeps,
            "hit sweep limit before convergence"
        );
    }

    let mut acc = ThermoAccumulator::new();
    if cfg.measure_sweeps == 0 {
        acc.push_lattice(lattice);
    } else {
        for _ in 0..cfg.measure_sweeps {
            lattice.sweep(rng)?;
            acc.push_lattice(lattice);
        }
    }
    Ok(acc.summary(lattice.n_sites(), lattice.temperature()))
}
