// error.rs - Error taxonomy shared by the lattice core and its collaborators

use thiserror::Error;

/// Root error type for lattice construction, updates and snapshot I/O.
#[derive(Error, Debug)]
pub enum IsingError {
    /// Malformed constructor or parameter input (size, probability, temperature, coordinates).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Lattice contents violate the spin invariant, or a snapshot describes no valid grid.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An external collaborator (snapshot file, output directory, ffmpeg) is missing or failed.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, IsingError>;
