use super::grayscale::apply_lut;
use super::histogram::{Histogram, red_histogram};
use crate::models::PixelBuffer;

/// Binary threshold: red `<= threshold` becomes 0, anything above becomes 255.
///
/// Written to R, G, B; alpha is untouched.
pub fn threshold(buffer: &mut PixelBuffer, threshold: u8) {
    let mut lut = [255u8; 256];
    lut[..=threshold as usize].fill(0);
    apply_lut(buffer, &lut);
}

/// Otsu's threshold over the red channel of `buffer`
pub fn otsu_threshold(buffer: &PixelBuffer) -> u8 {
    otsu_threshold_from_histogram(&red_histogram(buffer))
}

/// Calculate Otsu's optimal threshold from a histogram.
///
/// Split `i` puts levels `0..=i` in class A. Only splits with both classes
/// non-empty are considered. When several splits share the maximal
/// inter-class variance (empty bins between two modes) the middle of that
/// run is returned. A histogram with fewer than two occupied levels yields 0.
pub fn otsu_threshold_from_histogram(histogram: &Histogram) -> u8 {
    let total: u64 = histogram.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return 0;
    }
    let total_f = total as f64;

    let mut weighted_total = 0.0f64;
    for (level, &count) in histogram.iter().enumerate() {
        weighted_total += level as f64 * (count as f64 / total_f);
    }

    let mut cum_count = 0u64;
    let mut cum_prob = 0.0f64;
    let mut cum_weighted = 0.0f64;
    let mut max_variance = 0.0f64;
    let mut best: Option<(usize, usize)> = None;

    for (i, &count) in histogram.iter().enumerate() {
        let p = count as f64 / total_f;
        cum_count += count as u64;
        cum_prob += p;
        cum_weighted += i as f64 * p;

        if cum_count == 0 || cum_count == total {
            continue;
        }

        let p_a = cum_prob;
        let p_b = 1.0 - p_a;
        let mean_a = cum_weighted / p_a;
        let mean_b = (weighted_total - cum_weighted) / p_b;
        let variance = p_a * p_b * (mean_a - mean_b).powi(2);

        let tied = (variance - max_variance).abs() <= max_variance * 1e-9;
        if tied && best.is_some() {
            best = best.map(|(first, _)| (first, i));
        } else if variance > max_variance {
            max_variance = variance;
            best = Some((i, i));
        }
    }

    best.map(|(first, last)| ((first + last) / 2) as u8).unwrap_or(0)
}
