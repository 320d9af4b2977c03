use super::grayscale::apply_lut;
use super::histogram::{cumulative, red_histogram};
use crate::models::PixelBuffer;

/// Remap table for histogram equalization: `round(CDF[v] / CDF[255] * 255)`.
///
/// `None` when the buffer has no pixels.
pub fn equalization_lut(buffer: &PixelBuffer) -> Option<[u8; 256]> {
    let cdf = cumulative(&red_histogram(buffer));
    let total = cdf[255];
    if total == 0 {
        return None;
    }

    let mut lut = [0u8; 256];
    for (v, slot) in lut.iter_mut().enumerate() {
        *slot = (cdf[v] as f64 / total as f64 * 255.0).round() as u8;
    }
    Some(lut)
}

/// Histogram-equalize the red channel and write the result to R, G, B.
///
/// The buffer is expected to be grayscale already; otherwise red acts as the
/// luma proxy. Empty buffers are left unchanged.
pub fn equalize(buffer: &mut PixelBuffer) {
    if let Some(lut) = equalization_lut(buffer) {
        apply_lut(buffer, &lut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equalize_spreads_levels() {
        // Four levels packed into 100..=103 spread over the full range
        let mut buf = PixelBuffer::from_luma(4, 1, &[100, 101, 102, 103]).unwrap();
        equalize(&mut buf);
        let out = buf.red_channel();
        assert_eq!(out, vec![64, 128, 191, 255]);
        assert_eq!(buf.pixel(0, 0), [64, 64, 64, 255]);
    }

    #[test]
    fn test_equalize_single_level_is_constant() {
        let mut buf = PixelBuffer::from_luma(3, 3, &[42; 9]).unwrap();
        equalize(&mut buf);
        assert!(buf.red_channel().iter().all(|&v| v == 255));
    }

    #[test]
    fn test_equalize_empty_buffer_unchanged() {
        let mut buf = PixelBuffer::new(0, 0);
        equalize(&mut buf);
        assert!(buf.is_empty());
        assert!(equalization_lut(&buf).is_none());
    }
}
