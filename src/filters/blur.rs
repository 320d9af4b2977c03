//! Separable box blur
//!
//! A horizontal pass stores raw window sums per row, the vertical pass sums
//! those over a window of rows and divides by `(2r + 1)^2`. Both passes keep
//! a running sum (add the entering sample, subtract the leaving one), so the
//! cost is O(width * height) regardless of radius. Samples outside the
//! buffer clamp to the nearest border pixel. All four channels are blurred.

use crate::models::PixelBuffer;
use crate::models::pixel_buffer::CHANNELS;
use rayon::prelude::*;

/// Sum of `len` samples starting at clamped index 0, window `[-r, r]`.
///
/// `sample(i)` is only called with `i` in `0..len`.
#[inline]
fn initial_window<F: Fn(usize) -> u128>(sample: F, len: usize, r: usize) -> u128 {
    // Left of the border every sample equals sample(0).
    let mut sum = (r as u128 + 1) * sample(0);
    let inside = r.min(len - 1);
    for i in 1..=inside {
        sum += sample(i);
    }
    if r > inside {
        sum += (r - inside) as u128 * sample(len - 1);
    }
    sum
}

fn horizontal_pass(row: &[u8], out: &mut [u64], width: usize, r: usize) {
    for c in 0..CHANNELS {
        let at = |x: usize| row[x * CHANNELS + c] as u128;
        let mut sum = initial_window(at, width, r);
        for x in 0..width {
            // At most (2r + 1) * 255, which fits u64 for any u32 radius.
            out[x * CHANNELS + c] = sum as u64;
            let entering = x.saturating_add(r).saturating_add(1).min(width - 1);
            let leaving = x.saturating_sub(r);
            sum = sum + at(entering) - at(leaving);
        }
    }
}

fn vertical_pass(sums: &[u64], out: &mut [u8], width: usize, height: usize, r: usize) {
    let side = 2 * r as u128 + 1;
    let divisor = side * side;
    let stride = width * CHANNELS;
    for col in 0..stride {
        let at = |y: usize| sums[y * stride + col] as u128;
        let mut sum = initial_window(at, height, r);
        for y in 0..height {
            out[y * stride + col] = ((sum + divisor / 2) / divisor) as u8;
            let entering = y.saturating_add(r).saturating_add(1).min(height - 1);
            let leaving = y.saturating_sub(r);
            sum = sum + at(entering) - at(leaving);
        }
    }
}

/// Box blur `buffer` in place, repeating `quality` times (at least once).
///
/// A zero radius leaves the buffer unchanged.
pub fn box_blur(buffer: &mut PixelBuffer, radius: u32, quality: u32) {
    if radius == 0 || buffer.is_empty() {
        return;
    }
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let r = radius as usize;
    let stride = width * CHANNELS;
    let mut sums = vec![0u64; stride * height];

    for _ in 0..quality.max(1) {
        sums.par_chunks_mut(stride)
            .zip(buffer.data().par_chunks(stride))
            .for_each(|(out, row)| horizontal_pass(row, out, width, r));
        vertical_pass(&sums, buffer.data_mut(), width, height, r);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(buf: &PixelBuffer) -> u64 {
        buf.data().iter().map(|&v| v as u64).sum()
    }

    #[test]
    fn test_constant_image_is_unchanged() {
        let mut buf = PixelBuffer::filled(13, 9, [90, 12, 200, 255]);
        let before = buf.clone();
        box_blur(&mut buf, 3, 2);
        assert_eq!(buf, before);
    }

    #[test]
    fn test_radius_larger_than_image() {
        let mut buf = PixelBuffer::filled(3, 2, [40, 40, 40, 40]);
        let before = buf.clone();
        box_blur(&mut buf, 10, 1);
        assert_eq!(buf, before);
    }

    #[test]
    fn test_huge_radius_keeps_constant_image() {
        let mut buf = PixelBuffer::filled(4, 3, [255, 255, 255, 255]);
        let before = buf.clone();
        box_blur(&mut buf, 3000, 1);
        assert_eq!(buf, before);

        let mut buf = PixelBuffer::filled(2, 2, [255, 0, 128, 255]);
        let before = buf.clone();
        box_blur(&mut buf, u32::MAX, 1);
        assert_eq!(buf, before);
    }

    #[test]
    fn test_zero_radius_noop() {
        let mut buf = PixelBuffer::from_luma(3, 1, &[0, 255, 0]).unwrap();
        let before = buf.clone();
        box_blur(&mut buf, 0, 3);
        assert_eq!(buf, before);
    }

    #[test]
    fn test_single_bright_pixel_spreads() {
        // 5x5 black with one white center pixel, radius 1 -> 3x3 of 255/9
        let mut luma = vec![0u8; 25];
        luma[12] = 255;
        let mut buf = PixelBuffer::from_luma(5, 5, &luma).unwrap();
        box_blur(&mut buf, 1, 1);
        assert_eq!(buf.pixel(2, 2)[0], 28);
        assert_eq!(buf.pixel(1, 1)[0], 28);
        assert_eq!(buf.pixel(3, 3)[0], 28);
        assert_eq!(buf.pixel(0, 0)[0], 0);
        assert_eq!(buf.pixel(2, 2)[3], 255);
    }

    #[test]
    fn test_energy_roughly_preserved() {
        let luma: Vec<u8> = (0..64u32).map(|i| ((i * 37) % 256) as u8).collect();
        let mut buf = PixelBuffer::from_luma(8, 8, &luma).unwrap();
        let before = total(&buf) as f64;
        box_blur(&mut buf, 1, 1);
        let after = total(&buf) as f64;
        // Border clamping reweights edge pixels, so only a loose bound holds.
        assert!((before - after).abs() / before < 0.1);
    }
}
