pub mod error;
pub mod neighbors;
pub mod lattice;
pub mod metropolis;
pub mod observables;
pub mod simulation;
pub mod snapshot;
pub mod render;
pub mod utils;

pub use error::{IsingError, Result};
pub use lattice::Lattice;
pub use metropolis::SweepInfo;
pub use neighbors::neighbors;
