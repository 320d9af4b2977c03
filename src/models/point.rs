/// Point reported by a symbol decoder, in decoded-bitmap coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResultPoint {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl ResultPoint {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate point by (dx, dy)
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Divide both coordinates by `factor`
    pub fn unscale(&self, factor: f64) -> Self {
        Self {
            x: self.x / factor,
            y: self.y / factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_and_unscale() {
        let p = ResultPoint::new(10.0, 4.0);
        assert_eq!(p.translate(1.0, -1.0), ResultPoint::new(11.0, 3.0));
        assert_eq!(p.unscale(2.0), ResultPoint::new(5.0, 2.0));
    }
}
