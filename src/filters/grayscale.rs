//! Per-pixel color filters over RGBA buffers
//!
//! Gray = round((R + G + B) / 3), computed in integers as (R + G + B + 1) / 3.
//! Rows are processed in parallel with rayon; every pixel is independent so
//! the result is identical to a sequential pass.

use crate::models::PixelBuffer;
use crate::models::pixel_buffer::CHANNELS;
use rayon::prelude::*;

/// Rows per rayon task; small buffers stay on one thread
const ROWS_PER_TASK: usize = 16;

#[inline]
fn average(r: u8, g: u8, b: u8) -> u8 {
    ((r as u16 + g as u16 + b as u16 + 1) / 3) as u8
}

fn for_each_pixel<F>(buffer: &mut PixelBuffer, f: F)
where
    F: Fn(&mut [u8]) + Sync + Send,
{
    let row_bytes = (buffer.width() as usize * CHANNELS).max(CHANNELS);
    buffer
        .data_mut()
        .par_chunks_mut(row_bytes * ROWS_PER_TASK)
        .for_each(|rows| rows.chunks_exact_mut(CHANNELS).for_each(&f));
}

/// Replace R, G, B with their rounded average; alpha is untouched
pub fn grayscale(buffer: &mut PixelBuffer) {
    for_each_pixel(buffer, |px| {
        let avg = average(px[0], px[1], px[2]);
        px[0] = avg;
        px[1] = avg;
        px[2] = avg;
    });
}

/// R, G, B = 255 - R, 255 - G, 255 - B
pub fn invert(buffer: &mut PixelBuffer) {
    for_each_pixel(buffer, |px| {
        px[0] = 255 - px[0];
        px[1] = 255 - px[1];
        px[2] = 255 - px[2];
    });
}

/// Map every pixel's red channel through `lut` and write it to R, G, B
pub fn apply_lut(buffer: &mut PixelBuffer, lut: &[u8; 256]) {
    for_each_pixel(buffer, |px| {
        let v = lut[px[0] as usize];
        px[0] = v;
        px[1] = v;
        px[2] = v;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grayscale() {
        // Pure white
        let mut white = PixelBuffer::filled(1, 1, [255, 255, 255, 255]);
        grayscale(&mut white);
        assert_eq!(white.pixel(0, 0), [255, 255, 255, 255]);

        // Pure black
        let mut black = PixelBuffer::filled(1, 1, [0, 0, 0, 17]);
        grayscale(&mut black);
        assert_eq!(black.pixel(0, 0), [0, 0, 0, 17]);

        // Pure red: 255 / 3 = 85
        let mut red = PixelBuffer::filled(1, 1, [255, 0, 0, 255]);
        grayscale(&mut red);
        assert_eq!(red.pixel(0, 0), [85, 85, 85, 255]);
    }

    #[test]
    fn test_grayscale_rounds_to_nearest() {
        // (1 + 1 + 0) / 3 = 0.67 -> 1, (1 + 0 + 0) / 3 = 0.33 -> 0
        let mut buf = PixelBuffer::from_raw(2, 1, vec![1, 1, 0, 255, 1, 0, 0, 255]).unwrap();
        grayscale(&mut buf);
        assert_eq!(buf.pixel(0, 0)[0], 1);
        assert_eq!(buf.pixel(1, 0)[0], 0);
    }

    #[test]
    fn test_grayscale_many_rows() {
        let mut buf = PixelBuffer::filled(7, 40, [30, 60, 90, 255]);
        grayscale(&mut buf);
        assert!(buf.data().chunks_exact(4).all(|p| p == [60, 60, 60, 255]));
    }

    #[test]
    fn test_invert() {
        let mut buf = PixelBuffer::filled(2, 2, [10, 20, 250, 128]);
        invert(&mut buf);
        assert_eq!(buf.pixel(1, 1), [245, 235, 5, 128]);
    }
}
