//! Binary morphology with square structuring elements
//!
//! Rectangular elements are separable, so each operation is a horizontal
//! sweep followed by a vertical one. Neighbours outside the mask are ignored
//! rather than treated as background, so erosion does not eat into borders.

use crate::models::BinaryMask;

#[derive(Clone, Copy)]
enum Op {
    Erode,
    Dilate,
}

fn sweep(mask: &BinaryMask, size: usize, horizontal: bool, op: Op) -> BinaryMask {
    let width = mask.width();
    let height = mask.height();
    let mut out = BinaryMask::new(width, height);
    let before = size / 2;
    let after = size - 1 - before;
    let len = if horizontal { width } else { height };

    for y in 0..height {
        for x in 0..width {
            let pos = if horizontal { x } else { y };
            let lo = pos.saturating_sub(before);
            let hi = (pos + after).min(len - 1);
            let sample = |i: usize| {
                if horizontal {
                    mask.get(i, y)
                } else {
                    mask.get(x, i)
                }
            };
            let value = match op {
                Op::Erode => (lo..=hi).all(sample),
                Op::Dilate => (lo..=hi).any(sample),
            };
            out.set(x, y, value);
        }
    }
    out
}

fn apply(mask: &BinaryMask, size: usize, op: Op) -> BinaryMask {
    if size <= 1 || mask.width() == 0 || mask.height() == 0 {
        return mask.clone();
    }
    let horizontal = sweep(mask, size, true, op);
    sweep(&horizontal, size, false, op)
}

/// Erode with a `size x size` rectangle
pub fn erode(mask: &BinaryMask, size: usize) -> BinaryMask {
    apply(mask, size, Op::Erode)
}

/// Dilate with a `size x size` rectangle
pub fn dilate(mask: &BinaryMask, size: usize) -> BinaryMask {
    apply(mask, size, Op::Dilate)
}

/// Erode then dilate: removes specks smaller than the element
pub fn open(mask: &BinaryMask, size: usize) -> BinaryMask {
    dilate(&erode(mask, size), size)
}

/// Dilate then erode: fills gaps smaller than the element
pub fn close(mask: &BinaryMask, size: usize) -> BinaryMask {
    erode(&dilate(mask, size), size)
}

/// The extractor's clean-up: open with 3x3, then close with 5x5
pub fn denoise(mask: &BinaryMask) -> BinaryMask {
    close(&open(mask, 3), 5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(mask: &mut BinaryMask, x0: usize, y0: usize, w: usize, h: usize) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.set(x, y, true);
            }
        }
    }

    #[test]
    fn test_open_removes_speck() {
        let mut mask = BinaryMask::new(12, 12);
        fill(&mut mask, 2, 2, 5, 5);
        mask.set(10, 10, true);
        let opened = open(&mask, 3);
        assert!(!opened.get(10, 10));
        assert!(opened.get(2, 2));
        assert!(opened.get(6, 6));
        assert_eq!(opened.count_ones(), 25);
    }

    #[test]
    fn test_close_fills_gap() {
        let mut mask = BinaryMask::new(20, 12);
        fill(&mut mask, 4, 4, 5, 4);
        fill(&mut mask, 10, 4, 5, 4);
        assert!(!mask.get(9, 5));
        let closed = close(&mask, 5);
        assert!(closed.get(9, 5));
        assert!(!closed.get(0, 0));
    }

    #[test]
    fn test_border_not_eroded() {
        let mut mask = BinaryMask::new(4, 4);
        fill(&mut mask, 0, 0, 4, 4);
        assert_eq!(erode(&mask, 3).count_ones(), 16);
    }

    #[test]
    fn test_dilate_grows_pixel() {
        let mut mask = BinaryMask::new(5, 5);
        mask.set(2, 2, true);
        let grown = dilate(&mask, 3);
        assert_eq!(grown.count_ones(), 9);
        assert!(grown.get(1, 1) && grown.get(3, 3));
    }
}
