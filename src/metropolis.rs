// metropolis.rs - Single-spin-flip Metropolis dynamics

use crate::error::Result;
use crate::lattice::Lattice;
use crate::neighbors::neighbors;
use rand::Rng;

/// Returned by [`Lattice::sweep`], lets the driver track acceptance in O(1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepInfo {
    pub trials: usize,
    pub accepted: usize,
}

impl SweepInfo {
    /// Fraction of trials that flipped a spin.
    pub fn acceptance_ratio(&self) -> f64 {
        self.accepted as f64 / self.trials as f64
    }
}

impl Lattice {
    /// Energy cost `2 s Σ s_nn` of flipping the spin at `(row, col)`.
    pub fn delta_energy(&self, row: usize, col: usize) -> Result<i32> {
        self.ensure_populated()?;
        Ok(self.flip_cost(row, col))
    }

    /// One Metropolis trial at a given site. Returns whether the spin flipped.
    ///
    /// A non-positive cost is accepted without touching `rng`; otherwise one
    /// uniform draw in [0, 1) is compared against `exp(-ΔE / T)`.
    pub fn attempt_flip(&mut self, row: usize, col: usize, rng: &mut impl Rng) -> Result<bool> {
        self.ensure_populated()?;
        Ok(self.trial(row, col, rng))
    }

    /// One sweep: `size²` trials at sites drawn uniformly with replacement,
    /// row index first, then column. Bumps `sweep_count` once at the end.
    pub fn sweep(&mut self, rng: &mut impl Rng) -> Result<SweepInfo> {
        self.ensure_populated()?;

        let size = self.size();
        let trials = self.n_sites();
        let mut accepted = 0;
        for _ in 0..trials {
            let row = rng.gen_range(0..size);
            let col = rng.gen_range(0..size);
            if self.trial(row, col, rng) {
                accepted += 1;
            }
        }
        self.finish_sweep();

        Ok(SweepInfo { trials, accepted })
    }

    #[inline(always)]
    fn flip_cost(&self, row: usize, col: usize) -> i32 {
        let nsum: i32 = neighbors(self.size(), row, col)
            .iter()
            .map(|&(r, c)| self.spin(r, c) as i32)
            .sum();
        2 * self.spin(row, col) as i32 * nsum
    }

    // Caller has checked the lattice is populated.
    #[inline(always)]
    fn trial(&mut self, row: usize, col: usize, rng: &mut impl Rng) -> bool {
        let delta_e = self.flip_cost(row, col);
        let accept = if delta_e <= 0 {
            true
        } else {
            rng.gen::<f64>() < acceptance_probability(delta_e, self.temperature())
        };
        if accept {
            self.flip(row, col);
        }
        accept
    }
}

/// `exp(-ΔE / T)` for ΔE > 0, exactly zero at T = 0.
#[inline(always)]
fn acceptance_probability(delta_e: i32, temperature: f64) -> f64 {
    if temperature > 0.0 {
        (-(delta_e as f64) / temperature).exp()
    } else {
        0.0
    }
}
