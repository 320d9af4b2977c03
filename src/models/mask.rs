use super::PixelBuffer;
use super::pixel_buffer::CHANNELS;

/// Compact binary mask, `true` marks foreground
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl BinaryMask {
    /// Create an all-background mask with given dimensions
    pub fn new(width: usize, height: usize) -> Self {
        let bytes_needed = (width * height).div_ceil(8);
        Self {
            width,
            height,
            data: vec![0; bytes_needed],
        }
    }

    /// Binarize the red channel of `buffer` against `threshold`.
    ///
    /// With `dark_foreground`, pixels `<= threshold` are foreground; otherwise
    /// pixels `> threshold` are.
    pub fn from_buffer(buffer: &PixelBuffer, threshold: u8, dark_foreground: bool) -> Self {
        let width = buffer.width() as usize;
        let height = buffer.height() as usize;
        let mut mask = Self::new(width, height);
        for (i, px) in buffer.data().chunks_exact(CHANNELS).enumerate() {
            let dark = px[0] <= threshold;
            if dark == dark_foreground {
                mask.set(i % width, i / width, true);
            }
        }
        mask
    }

    /// Get mask width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Get mask height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get bit at (x, y); out of bounds reads as background
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y * self.width + x;
        (self.data[index / 8] >> (index % 8)) & 1 == 1
    }

    /// Set bit at (x, y); out of bounds writes are ignored
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y * self.width + x;
        let byte_index = index / 8;
        let bit_index = index % 8;
        if value {
            self.data[byte_index] |= 1 << bit_index;
        } else {
            self.data[byte_index] &= !(1 << bit_index);
        }
    }

    /// Number of foreground pixels
    pub fn count_ones(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_buffer_rows_do_not_wrap() {
        // 3x3 checkerboard: bits straddle byte boundaries
        let luma = [0, 255, 0, 255, 0, 255, 0, 255, 0];
        let buf = PixelBuffer::from_luma(3, 3, &luma).unwrap();
        let mask = BinaryMask::from_buffer(&buf, 128, true);
        assert_eq!((mask.width(), mask.height()), (3, 3));
        assert_eq!(mask.count_ones(), 5);
        assert!(mask.get(1, 1));
        assert!(mask.get(2, 2));
        assert!(!mask.get(1, 0));
        // Index 6 is (0, 2), which is set; (3, 1) must not alias it
        assert!(!mask.get(3, 1));
    }

    #[test]
    fn test_threshold_level_counts_as_dark() {
        let buf = PixelBuffer::from_luma(3, 1, &[127, 128, 129]).unwrap();
        let mask = BinaryMask::from_buffer(&buf, 128, true);
        assert!(mask.get(0, 0));
        assert!(mask.get(1, 0));
        assert!(!mask.get(2, 0));
        assert_eq!(mask.count_ones(), 2);
    }

    #[test]
    fn test_set_outside_is_ignored() {
        let mut mask = BinaryMask::new(5, 2);
        mask.set(5, 0, true);
        mask.set(0, 2, true);
        assert_eq!(mask.count_ones(), 0);
        mask.set(4, 1, true);
        mask.set(4, 1, false);
        assert_eq!(mask.count_ones(), 0);
    }

    #[test]
    fn test_from_buffer_polarity() {
        let buf = PixelBuffer::from_luma(2, 1, &[10, 200]).unwrap();
        let dark = BinaryMask::from_buffer(&buf, 128, true);
        assert!(dark.get(0, 0));
        assert!(!dark.get(1, 0));

        let light = BinaryMask::from_buffer(&buf, 128, false);
        assert!(!light.get(0, 0));
        assert!(light.get(1, 0));
    }
}
