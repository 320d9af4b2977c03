//! Normalized cross-correlation template matching on binary masks
//!
//! Score at offset (x, y) is the correlation coefficient between the
//! template and the equally sized snapshot window (both mean-subtracted),
//! in `[-1, 1]`. Windows or templates with zero variance score 0.

use crate::models::BinaryMask;
use rayon::prelude::*;

/// Best match of a template inside a snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateMatch {
    /// Left edge of the matched window
    pub x: usize,
    /// Top edge of the matched window
    pub y: usize,
    /// Correlation coefficient
    pub score: f64,
}

/// Summed-area table with a zero row/column prepended
struct Integral {
    width: usize,
    sums: Vec<u32>,
}

impl Integral {
    fn new(mask: &BinaryMask) -> Self {
        let width = mask.width() + 1;
        let mut sums = vec![0u32; width * (mask.height() + 1)];
        for y in 0..mask.height() {
            let mut row = 0u32;
            for x in 0..mask.width() {
                row += mask.get(x, y) as u32;
                sums[(y + 1) * width + x + 1] = sums[y * width + x + 1] + row;
            }
        }
        Self { width, sums }
    }

    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> u32 {
        let at = |x: usize, y: usize| self.sums[y * self.width + x];
        at(x + w, y + h) + at(x, y) - at(x + w, y) - at(x, y + h)
    }
}

/// Slide `template` over `snapshot` and return the highest-scoring offset.
///
/// `None` when the template is larger than the snapshot in either direction,
/// is empty, or has zero variance.
pub fn best_match(snapshot: &BinaryMask, template: &BinaryMask) -> Option<TemplateMatch> {
    let (tw, th) = (template.width(), template.height());
    let (sw, sh) = (snapshot.width(), snapshot.height());
    if tw == 0 || th == 0 || tw > sw || th > sh {
        return None;
    }

    let n = (tw * th) as f64;
    let t_sum = template.count_ones() as f64;
    let t_mean = t_sum / n;
    // Binary values: sum(t^2) == sum(t)
    let t_var = t_sum - t_sum * t_mean;
    if t_var <= f64::EPSILON {
        return None;
    }
    let t_norm = t_var.sqrt();

    // Only foreground snapshot pixels contribute to sum(T' * I).
    let weights: Vec<(usize, usize, f64)> = (0..th)
        .flat_map(|y| (0..tw).map(move |x| (x, y)))
        .map(|(x, y)| (x, y, template.get(x, y) as u8 as f64 - t_mean))
        .collect();
    let integral = Integral::new(snapshot);

    (0..=sh - th)
        .into_par_iter()
        .filter_map(|y| {
            let mut row_best: Option<TemplateMatch> = None;
            for x in 0..=sw - tw {
                let i_sum = integral.window(x, y, tw, th) as f64;
                let i_var = i_sum - i_sum * i_sum / n;
                let score = if i_var <= f64::EPSILON {
                    0.0
                } else {
                    let cross: f64 = weights
                        .iter()
                        .filter(|(dx, dy, _)| snapshot.get(x + dx, y + dy))
                        .map(|(_, _, w)| w)
                        .sum();
                    cross / (t_norm * i_var.sqrt())
                };
                if row_best.is_none_or(|b| score > b.score) {
                    row_best = Some(TemplateMatch { x, y, score });
                }
            }
            row_best
        })
        .reduce_with(|a, b| {
            // Ties resolve to the top-most, then left-most offset
            if b.score > a.score || (b.score == a.score && (b.y, b.x) < (a.y, a.x)) {
                b
            } else {
                a
            }
        })
}
