// lattice.rs - Square spin lattice with periodic boundaries

use crate::error::{IsingError, Result};
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};

/// Value of a single site: +1 (up) or -1 (down) once populated.
pub type Spin = i8;

/// A `size × size` Ising lattice.
///
/// Spins are stored row-major. A freshly allocated lattice holds zeros, which
/// are not valid spins; it must be populated (randomized, filled, built from
/// explicit spins or read from a snapshot) before it can be swept.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    size: usize,
    spins: Vec<Spin>,
    temperature: f64,
    sweep_count: u64,
    populated: bool,
}

impl Lattice {
    /// Allocate an unpopulated lattice at temperature 1.0.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(IsingError::InvalidArgument(
                "lattice size must be positive".to_string(),
            ));
        }
        Ok(Self {
            size,
            spins: vec![0; size * size],
            temperature: 1.0,
            sweep_count: 0,
            populated: false,
        })
    }

    /// A lattice with every spin set to `spin`.
    pub fn filled(size: usize, spin: Spin) -> Result<Self> {
        check_spin(spin)?;
        let mut lattice = Self::new(size)?;
        lattice.spins.fill(spin);
        lattice.populated = true;
        Ok(lattice)
    }

    /// A lattice from explicit row-major spins.
    pub fn from_spins(size: usize, spins: Vec<Spin>) -> Result<Self> {
        let mut lattice = Self::new(size)?;
        if spins.len() != size * size {
            return Err(IsingError::InvalidArgument(format!(
                "expected {} spins for a {size}x{size} lattice, got {}",
                size * size,
                spins.len()
            )));
        }
        if let Some(pos) = spins.iter().position(|&s| s != 1 && s != -1) {
            return Err(IsingError::InvalidState(format!(
                "spin {} at ({}, {}) is not +1 or -1",
                spins[pos],
                pos / size,
                pos % size
            )));
        }
        lattice.spins = spins;
        lattice.populated = true;
        Ok(lattice)
    }

    /// Set every spin to +1 with probability `p`, -1 otherwise, row by row.
    pub fn randomize(&mut self, p: f64, rng: &mut impl Rng) -> Result<()> {
        let up = Bernoulli::new(p).map_err(|_| {
            IsingError::InvalidArgument(format!("probability {p} is outside [0, 1]"))
        })?;
        for s in &mut self.spins {
            *s = if up.sample(rng) { 1 } else { -1 };
        }
        self.populated = true;
        Ok(())
    }

    /// All spins up. `sweep_count` is left untouched; it only ever grows.
    pub fn reset(&mut self) {
        self.spins.fill(1);
        self.populated = true;
    }

    /// Replace the temperature. Zero is the frozen limit where no
    /// energy-raising move is ever accepted.
    pub fn set_temperature(&mut self, t: f64) -> Result<()> {
        if !t.is_finite() || t < 0.0 {
            return Err(IsingError::InvalidArgument(format!(
                "temperature must be finite and non-negative, got {t}"
            )));
        }
        self.temperature = t;
        Ok(())
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of sites, `size²`.
    #[inline(always)]
    pub fn n_sites(&self) -> usize {
        self.spins.len()
    }

    #[inline(always)]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    #[inline(always)]
    pub fn sweep_count(&self) -> u64 {
        self.sweep_count
    }

    /// Whether every site holds a valid spin.
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    #[inline(always)]
    pub fn spin(&self, row: usize, col: usize) -> Spin {
        self.spins[self.index(row, col)]
    }

    pub fn set_spin(&mut self, row: usize, col: usize, value: Spin) -> Result<()> {
        check_spin(value)?;
        if row >= self.size || col >= self.size {
            return Err(IsingError::InvalidArgument(format!(
                "({row}, {col}) is outside a {0}x{0} lattice",
                self.size
            )));
        }
        let idx = self.index(row, col);
        self.spins[idx] = value;
        Ok(())
    }

    /// Row-major view of the grid.
    pub fn spins(&self) -> &[Spin] {
        &self.spins
    }

    /// Iterate over grid rows.
    pub fn rows(&self) -> impl Iterator<Item = &[Spin]> + '_ {
        self.spins.chunks(self.size)
    }

    #[inline(always)]
    pub(crate) fn index(&self, row: usize, col: usize) -> usize {
        row * self.size + col
    }

    #[inline(always)]
    pub(crate) fn flip(&mut self, row: usize, col: usize) {
        let idx = self.index(row, col);
        self.spins[idx] = -self.spins[idx];
    }

    pub(crate) fn finish_sweep(&mut self) {
        self.sweep_count += 1;
    }

    /// Fail fast if the grid has not been populated.
    pub(crate) fn ensure_populated(&self) -> Result<()> {
        if self.populated {
            Ok(())
        } else {
            Err(IsingError::InvalidState(
                "lattice holds unset (zero) spins; randomize or fill it first".to_string(),
            ))
        }
    }
}

fn check_spin(value: Spin) -> Result<()> {
    if value == 1 || value == -1 {
        Ok(())
    } else {
        Err(IsingError::InvalidState(format!(
            "spin value {value} is not +1 or -1"
        )))
    }
}
