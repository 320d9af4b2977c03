//! Maps decoder result points onto the overlays
//!
//! Decoder coordinates live in the (zoomed) snapshot buffer. The snapshot
//! overlay uses them directly, offset by the candidate's origin; the display
//! overlay divides by the zoom ratio and adds the crop origin:
//! `display = crop.x0 + (origin.x + p.x) / zoom`.

use crate::config::Color;
use crate::models::{CropRect, ResultPoint};
use crate::source::{DisplaySurface, Overlay, Polyline};

/// Points expressed in both overlay spaces
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Full-frame coordinates
    pub display: Vec<ResultPoint>,
    /// Snapshot (crop-local) coordinates
    pub snapshot: Vec<ResultPoint>,
}

/// Draws result geometry on a [`DisplaySurface`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultProjector {
    color: Color,
    line_width: f32,
}

impl ResultProjector {
    /// Projector stroking with `color` at `line_width`
    pub fn new(color: Color, line_width: f32) -> Self {
        Self { color, line_width }
    }

    /// Map decoder points into display and snapshot space
    pub fn project(
        points: &[ResultPoint],
        crop: &CropRect,
        zoom: f64,
        origin: (i32, i32),
    ) -> Projection {
        let zoom = if zoom > 0.0 { zoom } else { 1.0 };
        let snapshot: Vec<ResultPoint> = points
            .iter()
            .map(|p| p.translate(origin.0 as f64, origin.1 as f64))
            .collect();
        let display = snapshot
            .iter()
            .map(|p| p.unscale(zoom).translate(crop.x0 as f64, crop.y0 as f64))
            .collect();
        Projection { display, snapshot }
    }

    /// Replace both overlays with a closed polyline through `points`.
    ///
    /// Returns `false` and draws nothing when `points` is empty.
    pub fn draw<S: DisplaySurface + ?Sized>(
        &self,
        surface: &mut S,
        points: &[ResultPoint],
        crop: &CropRect,
        zoom: f64,
        origin: (i32, i32),
    ) -> bool {
        if points.is_empty() {
            return false;
        }
        let projection = Self::project(points, crop, zoom, origin);

        self.clear(surface);
        let display = Polyline {
            points: projection.display,
            closed: true,
        };
        let snapshot = Polyline {
            points: projection.snapshot,
            closed: true,
        };
        surface.draw_polyline(Overlay::Display, &display, self.color, self.line_width);
        surface.draw_polyline(Overlay::Snapshot, &snapshot, self.color, self.line_width);
        true
    }

    /// Erase both overlays
    pub fn clear<S: DisplaySurface + ?Sized>(&self, surface: &mut S) {
        surface.clear(Overlay::Display);
        surface.clear(Overlay::Snapshot);
    }
}
