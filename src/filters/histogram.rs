use crate::models::PixelBuffer;
use crate::models::pixel_buffer::CHANNELS;

/// Count of occurrences per gray level
pub type Histogram = [u32; 256];

/// Build a 256-bin histogram over the red channel
pub fn red_histogram(buffer: &PixelBuffer) -> Histogram {
    let mut histogram = [0u32; 256];
    for px in buffer.data().chunks_exact(CHANNELS) {
        histogram[px[0] as usize] += 1;
    }
    histogram
}

/// Running sum of a histogram; the last entry is the pixel count
pub fn cumulative(histogram: &Histogram) -> [u64; 256] {
    let mut cdf = [0u64; 256];
    let mut acc = 0u64;
    for (slot, &count) in cdf.iter_mut().zip(histogram.iter()) {
        acc += count as u64;
        *slot = acc;
    }
    cdf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_red_histogram_ignores_other_channels() {
        let buf = PixelBuffer::from_raw(2, 1, vec![5, 9, 9, 9, 5, 200, 200, 200]).unwrap();
        let h = red_histogram(&buf);
        assert_eq!(h[5], 2);
        assert_eq!(h[9], 0);
        assert_eq!(h.iter().sum::<u32>(), 2);
    }

    #[test]
    fn test_cumulative() {
        let mut h = [0u32; 256];
        h[0] = 1;
        h[10] = 3;
        let cdf = cumulative(&h);
        assert_eq!(cdf[0], 1);
        assert_eq!(cdf[9], 1);
        assert_eq!(cdf[10], 4);
        assert_eq!(cdf[255], 4);
    }
}
