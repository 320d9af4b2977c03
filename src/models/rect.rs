/// Axis-aligned rectangle in source-frame pixel coordinates
///
/// Signed so that geometry computed from display ratios can be represented
/// before it is clamped into a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRect {
    /// Left edge
    pub x0: i32,
    /// Top edge
    pub y0: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl CropRect {
    /// Create a new rectangle
    pub fn new(x0: i32, y0: i32, width: i32, height: i32) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> i32 {
        self.x0.saturating_add(self.width)
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i32 {
        self.y0.saturating_add(self.height)
    }

    /// True when the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Intersect with a `width x height` frame anchored at the origin.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the frame.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<CropRect> {
        if self.is_empty() {
            return None;
        }
        let fw = i32::try_from(width).unwrap_or(i32::MAX);
        let fh = i32::try_from(height).unwrap_or(i32::MAX);
        let x0 = self.x0.clamp(0, fw);
        let y0 = self.y0.clamp(0, fh);
        let x1 = self.right().clamp(0, fw);
        let y1 = self.bottom().clamp(0, fh);
        let clamped = CropRect::new(x0, y0, x1 - x0, y1 - y0);
        (!clamped.is_empty()).then_some(clamped)
    }

    /// True when the rectangle lies fully inside a `width x height` frame
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        !self.is_empty()
            && self.x0 >= 0
            && self.y0 >= 0
            && i64::from(self.right()) <= i64::from(width)
            && i64::from(self.bottom()) <= i64::from(height)
    }

    /// Grow by `pad` pixels on every side
    pub fn expand(&self, pad: i32) -> CropRect {
        CropRect::new(
            self.x0 - pad,
            self.y0 - pad,
            self.width + 2 * pad,
            self.height + 2 * pad,
        )
    }
}
