//! Owned interleaved RGBA buffer, the unit every filter operates on.

use super::CropRect;
use crate::error::{Result, ScanError};
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Bytes per pixel (R, G, B, A)
pub const CHANNELS: usize = 4;

/// Owned RGBA pixel buffer.
///
/// Invariant: `data.len() == 4 * width * height`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zero-filled buffer
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * CHANNELS],
        }
    }

    /// Allocate a buffer with every pixel set to `rgba`
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap raw RGBA bytes; `None` if the length does not match the size
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize * CHANNELS).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Build an RGBA buffer from 8-bit luma samples
    pub fn from_luma(width: u32, height: u32, luma: &[u8]) -> Option<Self> {
        if luma.len() != width as usize * height as usize {
            return None;
        }
        let mut data = Vec::with_capacity(luma.len() * CHANNELS);
        for &v in luma {
            data.extend_from_slice(&[v, v, v, 255]);
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Buffer width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when the buffer has no pixels
    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    /// Raw interleaved bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw interleaved bytes
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the buffer, returning its bytes
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// RGBA value at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Overwrite the RGBA value at (x, y)
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    /// Red channel of every pixel, the luma proxy used by the histogram filters
    pub fn red_channel(&self) -> Vec<u8> {
        self.data.iter().step_by(CHANNELS).copied().collect()
    }

    /// Copy `rect` out of `source`.
    ///
    /// The rectangle is clamped to the source bounds first; an empty result
    /// fails with [`ScanError::OutOfBounds`].
    pub fn from_region(source: &PixelBuffer, rect: CropRect) -> Result<Self> {
        let clamped = rect
            .clamp_to(source.width, source.height)
            .ok_or(ScanError::OutOfBounds {
                x: rect.x0,
                y: rect.y0,
                width: rect.width,
                height: rect.height,
            })?;

        let width = clamped.width as u32;
        let height = clamped.height as u32;
        let row_bytes = width as usize * CHANNELS;
        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for y in 0..height {
            let start = source.offset(clamped.x0 as u32, clamped.y0 as u32 + y);
            data.extend_from_slice(&source.data[start..start + row_bytes]);
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Write this buffer into `dest` with its top-left at the origin of `rect`.
    ///
    /// At most `rect.width x rect.height` pixels are written and anything
    /// falling outside `dest` is dropped.
    pub fn to_region(&self, dest: &mut PixelBuffer, rect: CropRect) -> Result<()> {
        let extent = CropRect::new(
            rect.x0,
            rect.y0,
            rect.width.min(self.width as i32),
            rect.height.min(self.height as i32),
        );
        let target = extent
            .clamp_to(dest.width, dest.height)
            .ok_or(ScanError::OutOfBounds {
                x: rect.x0,
                y: rect.y0,
                width: rect.width,
                height: rect.height,
            })?;

        // Offset into self when the rect started left of / above dest.
        let sx = (target.x0 - rect.x0) as u32;
        let sy = (target.y0 - rect.y0) as u32;
        let row_bytes = target.width as usize * CHANNELS;
        for row in 0..target.height as u32 {
            let src = self.offset(sx, sy + row);
            let dst = dest.offset(target.x0 as u32, target.y0 as u32 + row);
            dest.data[dst..dst + row_bytes].copy_from_slice(&self.data[src..src + row_bytes]);
        }
        Ok(())
    }

    /// Return a copy surrounded by a `pad`-pixel border of `fill`
    pub fn padded(&self, pad: u32, fill: [u8; 4]) -> Self {
        let mut out = Self::filled(self.width + 2 * pad, self.height + 2 * pad, fill);
        let rect = CropRect::new(pad as i32, pad as i32, self.width as i32, self.height as i32);
        if !self.is_empty() {
            // The padded buffer always contains the interior rect.
            let _ = self.to_region(&mut out, rect);
        }
        out
    }

    /// Resample to `width x height` using a triangle filter
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if width == self.width && height == self.height {
            return self.clone();
        }
        if self.is_empty() || width == 0 || height == 0 {
            return Self::new(width, height);
        }
        let resized = imageops::resize(&self.to_rgba_image(), width, height, FilterType::Triangle);
        Self::from(resized)
    }

    /// Copy into an `image` crate buffer
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(w, h);
        for y in 0..h {
            for x in 0..w {
                buf.set_pixel(x, y, [(x * 10) as u8, (y * 10) as u8, 7, 255]);
            }
        }
        buf
    }

    #[test]
    fn test_allocate_zeroed() {
        let buf = PixelBuffer::new(3, 2);
        assert_eq!(buf.data().len(), 24);
        assert!(buf.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_raw_length_check() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_some());
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn test_from_region_copies_rect() {
        let src = gradient(8, 6);
        let region = PixelBuffer::from_region(&src, CropRect::new(2, 1, 3, 2)).unwrap();
        assert_eq!((region.width(), region.height()), (3, 2));
        assert_eq!(region.pixel(0, 0), [20, 10, 7, 255]);
        assert_eq!(region.pixel(2, 1), [40, 20, 7, 255]);
    }

    #[test]
    fn test_from_region_clamps() {
        let src = gradient(8, 6);
        let region = PixelBuffer::from_region(&src, CropRect::new(6, -2, 10, 4)).unwrap();
        assert_eq!((region.width(), region.height()), (2, 2));
        assert_eq!(region.pixel(0, 0), [60, 0, 7, 255]);
    }

    #[test]
    fn test_from_region_empty_fails() {
        let src = gradient(8, 6);
        let err = PixelBuffer::from_region(&src, CropRect::new(0, 0, 0, 4)).unwrap_err();
        assert!(matches!(err, ScanError::OutOfBounds { .. }));
        assert!(PixelBuffer::from_region(&src, CropRect::new(9, 0, 3, 3)).is_err());
    }

    #[test]
    fn test_to_region_writes_back() {
        let src = gradient(8, 6);
        let rect = CropRect::new(2, 1, 3, 2);
        let region = PixelBuffer::from_region(&src, rect).unwrap();
        let mut dest = PixelBuffer::new(8, 6);
        region.to_region(&mut dest, rect).unwrap();
        assert_eq!(dest.pixel(2, 1), src.pixel(2, 1));
        assert_eq!(dest.pixel(4, 2), src.pixel(4, 2));
        assert_eq!(dest.pixel(5, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn test_to_region_clips_to_dest() {
        let patch = PixelBuffer::filled(4, 4, [9, 9, 9, 9]);
        let mut dest = PixelBuffer::new(5, 5);
        patch.to_region(&mut dest, CropRect::new(-2, 3, 4, 4)).unwrap();
        assert_eq!(dest.pixel(0, 3), [9, 9, 9, 9]);
        assert_eq!(dest.pixel(1, 4), [9, 9, 9, 9]);
        assert_eq!(dest.pixel(2, 4), [0, 0, 0, 0]);
    }

    #[test]
    fn test_padded() {
        let buf = PixelBuffer::filled(2, 2, [0, 0, 0, 255]);
        let out = buf.padded(3, [255, 255, 255, 255]);
        assert_eq!((out.width(), out.height()), (8, 8));
        assert_eq!(out.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(out.pixel(3, 3), [0, 0, 0, 255]);
        assert_eq!(out.pixel(5, 5), [255, 255, 255, 255]);
    }

    #[test]
    fn test_resized_dimensions() {
        let buf = PixelBuffer::filled(10, 4, [50, 60, 70, 255]);
        let out = buf.resized(20, 8);
        assert_eq!((out.width(), out.height()), (20, 8));
        assert_eq!(out.pixel(10, 4), [50, 60, 70, 255]);
    }
}
