// snapshot.rs - Per-sweep configuration snapshots and observable series as CSV

use crate::error::{IsingError, Result};
use crate::lattice::{Lattice, Spin};
use crate::observables::Measurement;
use csv::{ReaderBuilder, Writer, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};

pub const SNAPSHOT_HEADER: [&str; 3] = ["row", "col", "spin"];
pub const SERIES_HEADER: [&str; 5] = ["sweep", "temperature", "energy", "magnetization", "accepted"];

/// Minimum zero padding of snapshot iteration numbers.
pub const MIN_PAD_WIDTH: usize = 5;

/// Padding wide enough for every iteration up to `last_iteration`, so that
/// lexical order of a run's files equals iteration order.
pub fn pad_width(last_iteration: u64) -> usize {
    last_iteration.to_string().len().max(MIN_PAD_WIDTH)
}

/// `<dir>/<prefix>_<iteration zero-padded to width>.csv`.
pub fn snapshot_path(dir: &Path, prefix: &str, iteration: u64, width: usize) -> PathBuf {
    dir.join(format!("{prefix}_{iteration:0width$}.csv"))
}

/// Write one `(row, col, spin)` record per site, row-major, after a header.
pub fn write_snapshot(lattice: &Lattice, path: &Path) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(SNAPSHOT_HEADER)?;
    for (row, spins) in lattice.rows().enumerate() {
        for (col, s) in spins.iter().enumerate() {
            wtr.write_record(&[row.to_string(), col.to_string(), s.to_string()])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Rebuild a lattice from a snapshot. The edge length is the square root of
/// the record count; each record lands at its own `(row, col)`.
pub fn read_snapshot(path: &Path) -> Result<Lattice> {
    if !path.is_file() {
        return Err(IsingError::ResourceUnavailable(format!(
            "snapshot {} does not exist",
            path.display()
        )));
    }

    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut records = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        if record.len() < 3 {
            return Err(IsingError::InvalidArgument(format!(
                "{}: record {} has {} fields, expected 3",
                path.display(),
                line + 1,
                record.len()
            )));
        }
        let row = parse_field::<usize>(&record[0], path, line)?;
        let col = parse_field::<usize>(&record[1], path, line)?;
        let spin = parse_field::<f64>(&record[2], path, line)?;
        records.push((row, col, spin));
    }

    let size = (records.len() as f64).sqrt().round() as usize;
    if size == 0 || size * size != records.len() {
        return Err(IsingError::InvalidState(format!(
            "{}: {} records do not form a square grid",
            path.display(),
            records.len()
        )));
    }

    let mut spins: Vec<Spin> = vec![0; size * size];
    for (row, col, spin) in records {
        if row >= size || col >= size {
            return Err(IsingError::InvalidState(format!(
                "{}: site ({row}, {col}) is outside a {size}x{size} grid",
                path.display()
            )));
        }
        let cell = &mut spins[row * size + col];
        if *cell != 0 {
            return Err(IsingError::InvalidState(format!(
                "{}: site ({row}, {col}) appears twice",
                path.display()
            )));
        }
        *cell = to_spin(spin).ok_or_else(|| {
            IsingError::InvalidState(format!(
                "{}: spin {spin} at ({row}, {col}) is not +1 or -1",
                path.display()
            ))
        })?;
    }

    Lattice::from_spins(size, spins)
}

/// Snapshot files named `<prefix>_<digits>.csv` in `dir`, ordered by the
/// numeric iteration rather than by name.
pub fn list_snapshots(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IsingError::ResourceUnavailable(format!(
            "snapshot directory {} does not exist",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let iteration = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|name| snapshot_iteration(name, prefix));
        if let Some(iteration) = iteration {
            files.push((iteration, path));
        }
    }
    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

fn snapshot_iteration(name: &str, prefix: &str) -> Option<u64> {
    let digits = name
        .strip_prefix(prefix)?
        .strip_prefix('_')?
        .strip_suffix(".csv")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn parse_field<T: std::str::FromStr>(field: &str, path: &Path, line: usize) -> Result<T> {
    field.trim().parse().map_err(|_| {
        IsingError::InvalidArgument(format!(
            "{}: record {} has unparsable field {field:?}",
            path.display(),
            line + 1
        ))
    })
}

fn to_spin(value: f64) -> Option<Spin> {
    if value == 1.0 {
        Some(1)
    } else if value == -1.0 {
        Some(-1)
    } else {
        None
    }
}

/// Per-sweep observable series, one row per [`Measurement`].
pub struct SeriesWriter {
    wtr: Writer<File>,
}

impl SeriesWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let mut wtr = WriterBuilder::new().from_path(path)?;
        wtr.write_record(SERIES_HEADER)?;
        Ok(Self { wtr })
    }

    pub fn write(&mut self, m: &Measurement) -> Result<()> {
        self.wtr.write_record(&[
            m.sweep.to_string(),
            m.temperature.to_string(),
            m.energy.to_string(),
            m.magnetization.to_string(),
            m.accepted.to_string(),
        ])?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.wtr.flush()?;
        Ok(())
    }
}
