// src/bin/render_maps.rs - Turn a directory of snapshots into frames and a video

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ising2d::render::{clear_frames, encode_video, frame_path, save_frame, ColorMap, DEFAULT_FPS};
use ising2d::snapshot::{list_snapshots, read_snapshot};
use ising2d::IsingError;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
struct Cli {
    /// Directory holding <prefix>_<iteration>.csv snapshots
    #[arg(short, long)]
    dir: PathBuf,

    /// Snapshot file prefix
    #[arg(long, default_value = "ising_2d_map")]
    prefix: String,

    /// Render at most this many snapshots (0 = all)
    #[arg(short = 'n', long, default_value = "0")]
    max_frames: usize,

    /// Pixels per lattice site
    #[arg(long, default_value = "4")]
    scale: u32,

    /// Video frame rate
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: u32,

    /// Output video (defaults to <dir>/<prefix>.mp4)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only write PNG frames
    #[arg(long)]
    no_video: bool,
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

    let mut files = list_snapshots(&args.dir, &args.prefix)?;
    if files.is_empty() {
        return Err(IsingError::ResourceUnavailable(format!(
            "no {}_*.csv snapshots in {}",
            args.prefix,
            args.dir.display()
        ))
        .into());
    }
    if args.max_frames > 0 {
        files.truncate(args.max_frames);
    }
    info!(n_frames = files.len(), "rendering snapshots");

    let frames_dir = args.dir.join("frames");
    fs::create_dir_all(&frames_dir)?;
    let stale = clear_frames(&frames_dir)?;
    if stale > 0 {
        info!(stale, "removed frames from a previous render");
    }
    let colors = ColorMap::default();

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        " {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}]",
    )?);
    for (i, file) in files.iter().enumerate() {
        let lattice = read_snapshot(file)?;
        save_frame(&lattice, args.scale, &colors, &frame_path(&frames_dir, i))?;
        bar.inc(1);
    }
    bar.finish();

    if args.no_video {
        println!("Frames written to {}", frames_dir.display());
        return Ok(());
    }

    let output = args
        .output
        .unwrap_or_else(|| args.dir.join(format!("{}.mp4", args.prefix)));
    match encode_video(&frames_dir, &output, args.fps) {
        Ok(()) => println!("Video written to {}", output.display()),
        Err(e @ IsingError::ResourceUnavailable(_)) => {
            warn!("{e}; frames left in {}", frames_dir.display());
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
