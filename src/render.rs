// render.rs - Spin grids to images and image sequences to video

use crate::error::{IsingError, Result};
use crate::lattice::{Lattice, Spin};
use image::{Rgb, RgbImage};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

pub const DEFAULT_FPS: u32 = 30;

/// Two-colour map for spins, defaulting to the ends of the plasma scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMap {
    pub down: Rgb<u8>,
    pub up: Rgb<u8>,
}

impl Default for ColorMap {
    fn default() -> Self {
        Self {
            down: Rgb([13, 8, 135]),
            up: Rgb([240, 249, 33]),
        }
    }
}

impl ColorMap {
    pub fn color(&self, spin: Spin) -> Rgb<u8> {
        if spin > 0 { self.up } else { self.down }
    }
}

/// One `scale × scale` block per site; row index runs down the image.
/// Fails with `InvalidArgument` when the image side does not fit in `u32`.
pub fn render_frame(lattice: &Lattice, scale: u32, colors: &ColorMap) -> Result<RgbImage> {
    let scale = scale.max(1);
    let side = u32::try_from(lattice.size())
        .ok()
        .and_then(|size| size.checked_mul(scale))
        .ok_or_else(|| {
            IsingError::InvalidArgument(format!(
                "a {0}x{0} lattice at scale {scale} overflows the image size",
                lattice.size()
            ))
        })?;
    Ok(RgbImage::from_fn(side, side, |x, y| {
        let row = (y / scale) as usize;
        let col = (x / scale) as usize;
        colors.color(lattice.spin(row, col))
    }))
}

/// Render and write a PNG.
pub fn save_frame(lattice: &Lattice, scale: u32, colors: &ColorMap, path: &Path) -> Result<()> {
    render_frame(lattice, scale, colors)?.save(path)?;
    Ok(())
}

/// `<dir>/frame_<index:05>.png`, the pattern [`encode_video`] reads.
pub fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("frame_{index:05}.png"))
}

/// Remove every `frame_<digits>.png` in `dir` so a shorter run cannot pick up
/// frames left behind by a longer one. Other files are kept. Returns the
/// number of frames removed; a missing directory removes nothing.
pub fn clear_frames(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_frame = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_frame_name);
        if is_frame && path.is_file() {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    if removed > 0 {
        debug!(dir = %dir.display(), removed, "cleared stale frames");
    }
    Ok(removed)
}

fn is_frame_name(name: &str) -> bool {
    name.strip_prefix("frame_")
        .and_then(|rest| rest.strip_suffix(".png"))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Stitch `frame_00000.png, frame_00001.png, ...` in `frames_dir` into an
/// H.264 MP4 with `ffmpeg`.
pub fn encode_video(frames_dir: &Path, output: &Path, fps: u32) -> Result<()> {
    let pattern = frames_dir.join("frame_%05d.png");
    info!(output = %output.display(), fps, "encoding video");

    let status = Command::new("ffmpeg")
        .arg("-y")
        .args(["-loglevel", "error"])
        .arg("-framerate")
        .arg(fps.to_string())
        .arg("-i")
        .arg(&pattern)
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
        .arg(output)
        .status()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                IsingError::ResourceUnavailable("ffmpeg not found on PATH".to_string())
            }
            _ => IsingError::Io(e),
        })?;

    if !status.success() {
        return Err(IsingError::ResourceUnavailable(format!(
            "ffmpeg exited with {status}"
        )));
    }
    Ok(())
}
