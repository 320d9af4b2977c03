//! Crop derivation from display geometry
//!
//! The scanner area is laid out in display pixels over a video element that
//! shows the frame scaled to `display_w x display_h`. Each tick the area is
//! mapped back into frame pixels, shrunk by the zoom ratio, and centred in
//! the frame.

use crate::config::ScanMode;
use crate::error::{Result, ScanError};
use crate::models::CropRect;

/// Strip height relative to width in [`ScanMode::OneD`]
pub const ONE_D_ASPECT: f64 = 0.35;

/// On-screen layout of the video and scanner area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    /// Rendered video width
    pub display_w: u32,
    /// Rendered video height
    pub display_h: u32,
    /// Scanner area width in display pixels
    pub area_w: u32,
    /// Scanner area height in display pixels
    pub area_h: u32,
}

impl DisplayGeometry {
    /// Video shown at native size with the scanner area covering all of it
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            display_w: width,
            display_h: height,
            area_w: width,
            area_h: height,
        }
    }

    /// Scanner area after applying `mode`
    pub fn shaped_area(&self, mode: ScanMode) -> (u32, u32) {
        match mode {
            ScanMode::Auto => (self.area_w, self.area_h),
            ScanMode::TwoD => {
                let side = self.area_w.min(self.area_h);
                (side, side)
            }
            ScanMode::OneD => {
                let strip = (self.area_w as f64 * ONE_D_ASPECT).round() as u32;
                (self.area_w, strip.clamp(1, self.area_h.max(1)))
            }
        }
    }
}

fn out_of_bounds(geometry: &DisplayGeometry) -> ScanError {
    ScanError::OutOfBounds {
        x: 0,
        y: 0,
        width: geometry.area_w as i32,
        height: geometry.area_h as i32,
    }
}

fn scaled_side(area: u32, ratio: f64, zoom: f64, frame: u32) -> u32 {
    let side = (area as f64 / ratio / zoom).round();
    (side as u32).clamp(1, frame)
}

/// Frame-space crop for the current tick.
///
/// The result is always contained in `frame_w x frame_h`. Fails with
/// [`ScanError::OutOfBounds`] when the frame, display, or area is empty.
pub fn crop_rect(
    frame_w: u32,
    frame_h: u32,
    geometry: &DisplayGeometry,
    zoom: f64,
    mode: ScanMode,
) -> Result<CropRect> {
    if frame_w == 0 || frame_h == 0 || geometry.display_w == 0 || geometry.display_h == 0 {
        return Err(out_of_bounds(geometry));
    }
    let (area_w, area_h) = geometry.shaped_area(mode);
    if area_w == 0 || area_h == 0 {
        return Err(out_of_bounds(geometry));
    }
    let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };

    let width_ratio = geometry.display_w as f64 / frame_w as f64;
    let height_ratio = geometry.display_h as f64 / frame_h as f64;
    let width = scaled_side(area_w, width_ratio, zoom, frame_w);
    let height = scaled_side(area_h, height_ratio, zoom, frame_h);

    Ok(CropRect::new(
        ((frame_w - width) / 2) as i32,
        ((frame_h - height) / 2) as i32,
        width as i32,
        height as i32,
    ))
}
