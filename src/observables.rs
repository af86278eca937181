// observables.rs - Energy, magnetization and their fluctuations

use crate::lattice::Lattice;
use crate::neighbors::neighbors;

impl Lattice {
    /// Nearest-neighbour energy with unit coupling. Every bond is seen from
    /// both ends, hence the halving.
    pub fn total_energy(&self) -> f64 {
        let size = self.size();
        let mut twice: i64 = 0;
        for row in 0..size {
            for col in 0..size {
                let nsum: i64 = neighbors(size, row, col)
                    .iter()
                    .map(|&(r, c)| self.spin(r, c) as i64)
                    .sum();
                twice -= self.spin(row, col) as i64 * nsum;
            }
        }
        twice as f64 / 2.0
    }

    /// Σ s over the grid.
    pub fn magnetization(&self) -> f64 {
        self.spins().iter().map(|&s| s as i64).sum::<i64>() as f64
    }
}

/// Observables recorded after one sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub sweep: u64,
    pub temperature: f64,
    pub energy: f64,
    pub magnetization: f64,
    pub accepted: usize,
}

impl Measurement {
    pub fn of(lattice: &Lattice, accepted: usize) -> Self {
        Self {
            sweep: lattice.sweep_count(),
            temperature: lattice.temperature(),
            energy: lattice.total_energy(),
            magnetization: lattice.magnetization(),
            accepted,
        }
    }
}

/// Per-spin thermodynamic estimates over a measurement window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThermoSummary {
    pub temperature: f64,
    pub sweeps: usize,
    pub energy: f64,
    pub magnetization: f64,
    pub abs_magnetization: f64,
    pub specific_heat: f64,
    pub susceptibility: f64,
    pub binder_cumulant: f64,
}

/// Running moments of total energy and magnetization.
#[derive(Debug, Clone, Default)]
pub struct ThermoAccumulator {
    n: usize,
    sum_e: f64,
    sum_e2: f64,
    sum_m: f64,
    sum_abs_m: f64,
    sum_m2: f64,
    sum_m4: f64,
}

impl ThermoAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, energy: f64, magnetization: f64) {
        let m2 = magnetization * magnetization;
        self.n += 1;
        self.sum_e += energy;
        self.sum_e2 += energy * energy;
        self.sum_m += magnetization;
        self.sum_abs_m += magnetization.abs();
        self.sum_m2 += m2;
        self.sum_m4 += m2 * m2;
    }

    pub fn push_lattice(&mut self, lattice: &Lattice) {
        self.push(lattice.total_energy(), lattice.magnetization());
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.n == 0 { 0.0 } else { sum / self.n as f64 }
    }

    /// Collapse the window into per-spin estimates for `n_sites` spins at `temperature`.
    ///
    /// C = Var(E) / (N T²), χ = (⟨M²⟩ - ⟨|M|⟩²) / (N T), U = 1 - ⟨M⁴⟩ / (3⟨M²⟩²).
    pub fn summary(&self, n_sites: usize, temperature: f64) -> ThermoSummary {
        let n = n_sites as f64;
        let e = self.mean(self.sum_e);
        let m2 = self.mean(self.sum_m2);
        let abs_m = self.mean(self.sum_abs_m);

        let fluctuating = self.n >= 2 && temperature > 0.0;
        let (specific_heat, susceptibility) = if fluctuating {
            let var_e = (self.mean(self.sum_e2) - e * e).max(0.0);
            let var_m = (m2 - abs_m * abs_m).max(0.0);
            (var_e / (n * temperature * temperature), var_m / (n * temperature))
        } else {
            (0.0, 0.0)
        };

        let binder_cumulant = if m2 > 0.0 {
            1.0 - self.mean(self.sum_m4) / (3.0 * m2 * m2)
        } else {
            0.0
        };

        ThermoSummary {
            temperature,
            sweeps: self.n,
            energy: e / n,
            magnetization: self.mean(self.sum_m) / n,
            abs_magnetization: abs_m / n,
            specific_heat,
            susceptibility,
            binder_cumulant,
        }
    }
}
