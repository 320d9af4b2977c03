//! Tooling shared by the CLI, benches and tests
//!
//! Image file IO, buffer statistics, and in-memory stand-ins for the camera
//! and display collaborators.

use crate::config::Color;
use crate::error::{Result, ScanError};
use crate::filters::histogram::red_histogram;
use crate::models::{BinaryMask, PixelBuffer};
use crate::source::{
    CameraSource, DeviceInfo, DisplaySurface, Overlay, Polyline, StreamConstraints,
};
use image::GenericImageView;
use std::env;
use std::path::{Path, PathBuf};

fn max_dim_from_env() -> Option<u32> {
    match env::var("SCAN_MAX_DIM") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(_) => None,
        },
        Err(_) => None,
    }
}

/// Load an image file as RGBA.
///
/// When `SCAN_MAX_DIM` is set the image is downscaled so its longer side
/// fits.
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<PixelBuffer> {
    let img = image::open(path)?;
    let rgba = match max_dim_from_env() {
        Some(max_dim) if img.dimensions().0.max(img.dimensions().1) > max_dim => img
            .resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
            .to_rgba8(),
        _ => img.to_rgba8(),
    };
    Ok(PixelBuffer::from(rgba))
}

/// Write a buffer to an image file; the format follows the extension
pub fn save_rgba<P: AsRef<Path>>(buffer: &PixelBuffer, path: P) -> Result<()> {
    buffer.to_rgba_image().save(path)?;
    Ok(())
}

/// Image files (png, jpg, jpeg, bmp) directly under `dir`, sorted
pub fn image_paths<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp"));
        if is_image && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Summary statistics for the red (luma) channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrayStats {
    /// Minimum level.
    pub min: u8,
    /// Maximum level.
    pub max: u8,
    /// Average level.
    pub avg: u8,
    /// Number of distinct levels present.
    pub levels: usize,
}

/// Summary statistics for a binary mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryStats {
    /// Count of foreground pixels.
    pub foreground: usize,
    /// Total pixels in the mask.
    pub total_pixels: usize,
    /// Ratio of foreground pixels to total pixels.
    pub foreground_ratio: f64,
}

/// Compute min/max/avg over the red channel; all zero for an empty buffer.
pub fn gray_stats(buffer: &PixelBuffer) -> GrayStats {
    if buffer.pixel_count() == 0 {
        return GrayStats {
            min: 0,
            max: 0,
            avg: 0,
            levels: 0,
        };
    }
    let histogram = red_histogram(buffer);
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut sum: u64 = 0;
    let mut levels = 0usize;
    for (level, &count) in histogram.iter().enumerate() {
        if count == 0 {
            continue;
        }
        min = min.min(level as u8);
        max = max.max(level as u8);
        sum += level as u64 * count as u64;
        levels += 1;
    }
    let avg = (sum / buffer.pixel_count() as u64) as u8;
    GrayStats {
        min,
        max,
        avg,
        levels,
    }
}

/// Compute foreground stats for a binary mask.
pub fn binary_stats(mask: &BinaryMask) -> BinaryStats {
    let foreground = mask.count_ones();
    let total = mask.width() * mask.height();
    let ratio = if total == 0 {
        0.0
    } else {
        foreground as f64 / total as f64
    };
    BinaryStats {
        foreground,
        total_pixels: total,
        foreground_ratio: ratio,
    }
}

/// Camera that replays a fixed list of frames.
///
/// Each `latest_frame` call advances to the next frame; the last one repeats
/// forever. Open streams are counted so tests can detect leaks: every
/// `open_stream` adds one and every `close` releases at most one.
#[derive(Debug, Clone)]
pub struct SequenceCamera {
    frames: Vec<PixelBuffer>,
    cursor: usize,
    devices: Vec<DeviceInfo>,
    available: bool,
    active_streams: usize,
    opened: usize,
    last_constraints: Option<StreamConstraints>,
}

impl SequenceCamera {
    /// Camera replaying `frames`, exposing a single default device
    pub fn new(frames: Vec<PixelBuffer>) -> Self {
        Self {
            frames,
            cursor: 0,
            devices: vec![DeviceInfo::camera("camera-0", "Camera 0")],
            available: true,
            active_streams: 0,
            opened: 0,
            last_constraints: None,
        }
    }

    /// Camera returning the same frame on every tick
    pub fn repeating(frame: PixelBuffer) -> Self {
        Self::new(vec![frame])
    }

    /// Replace the enumerated device list
    pub fn with_devices(mut self, devices: Vec<DeviceInfo>) -> Self {
        self.devices = devices;
        self
    }

    /// Make subsequent `open_stream` calls fail (or succeed again)
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Streams opened and not yet closed
    pub fn active_streams(&self) -> usize {
        self.active_streams
    }

    /// Total successful `open_stream` calls
    pub fn open_count(&self) -> usize {
        self.opened
    }

    /// Constraints of the last successful open
    pub fn last_constraints(&self) -> Option<&StreamConstraints> {
        self.last_constraints.as_ref()
    }
}

impl CameraSource for SequenceCamera {
    fn enumerate_devices(&mut self) -> Result<Vec<DeviceInfo>> {
        Ok(self.devices.clone())
    }

    fn open_stream(&mut self, constraints: &StreamConstraints) -> Result<()> {
        if !self.available {
            return Err(ScanError::DeviceUnavailable("camera is not available".into()));
        }
        if let Some(id) = &constraints.device_id
            && !self.devices.iter().any(|d| &d.id == id)
        {
            return Err(ScanError::DeviceUnavailable(format!("no device {id:?}")));
        }
        self.active_streams += 1;
        self.opened += 1;
        self.last_constraints = Some(constraints.clone());
        Ok(())
    }

    fn latest_frame(&mut self) -> Option<&PixelBuffer> {
        if self.active_streams == 0 || self.frames.is_empty() {
            return None;
        }
        let index = self.cursor.min(self.frames.len() - 1);
        self.cursor += 1;
        self.frames.get(index)
    }

    fn close(&mut self) {
        self.active_streams = self.active_streams.saturating_sub(1);
    }
}

/// A drawing command captured by [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    /// `draw_polyline`
    Polyline {
        /// Target overlay
        overlay: Overlay,
        /// Stroked path
        polyline: Polyline,
        /// Stroke colour
        color: Color,
        /// Stroke width
        width: f32,
    },
    /// `clear`
    Clear(Overlay),
    /// `resize`
    Resize {
        /// Target overlay
        overlay: Overlay,
        /// New width
        width: u32,
        /// New height
        height: u32,
    },
}

/// Display surface that records every command in order
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    /// Commands received so far
    pub commands: Vec<SurfaceCommand>,
}

impl RecordingSurface {
    /// Polylines drawn on `overlay`, oldest first
    pub fn polylines(&self, overlay: Overlay) -> Vec<&Polyline> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                SurfaceCommand::Polyline {
                    overlay: target,
                    polyline,
                    ..
                } if *target == overlay => Some(polyline),
                _ => None,
            })
            .collect()
    }

    /// Number of draw commands on any overlay
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, SurfaceCommand::Polyline { .. }))
            .count()
    }
}

impl DisplaySurface for RecordingSurface {
    fn draw_polyline(&mut self, overlay: Overlay, polyline: &Polyline, color: Color, line_width: f32) {
        self.commands.push(SurfaceCommand::Polyline {
            overlay,
            polyline: polyline.clone(),
            color,
            width: line_width,
        });
    }

    fn clear(&mut self, overlay: Overlay) {
        self.commands.push(SurfaceCommand::Clear(overlay));
    }

    fn resize(&mut self, overlay: Overlay, width: u32, height: u32) {
        self.commands.push(SurfaceCommand::Resize {
            overlay,
            width,
            height,
        });
    }
}
