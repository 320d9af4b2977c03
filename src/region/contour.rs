//! Connected components over a binary mask
//!
//! Each 8-connected foreground component has one external contour, so its
//! bounding box is the contour's axis-aligned bounding rectangle.

use crate::models::{BinaryMask, CropRect};
use std::collections::HashMap;

/// Union-Find data structure
pub struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    /// `n` singleton sets
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    /// Root of `x`'s set
    pub fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        // Path compression
        let mut node = x;
        while self.parent[node as usize] != root {
            let next = self.parent[node as usize];
            self.parent[node as usize] = root;
            node = next;
        }
        root
    }

    /// Merge the sets holding `x` and `y`
    pub fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x != root_y {
            self.parent[root_x as usize] = root_y;
        }
    }
}

/// Bounding boxes of every 8-connected foreground component
pub fn component_bounds(mask: &BinaryMask) -> Vec<CropRect> {
    let width = mask.width();
    let height = mask.height();

    let mut labels = vec![0u32; width * height];
    let mut next_label = 1u32;
    // Label 0 is background; at most one new label per pixel.
    let mut uf = UnionFind::new(width * height + 1);

    // First pass: label components
    for y in 0..height {
        for x in 0..width {
            if !mask.get(x, y) {
                continue;
            }

            let mut neighbors = [0u32; 4];
            let mut n = 0;
            if x > 0 && mask.get(x - 1, y) {
                neighbors[n] = labels[y * width + x - 1];
                n += 1;
            }
            if y > 0 {
                let above = (y - 1) * width;
                if x > 0 && mask.get(x - 1, y - 1) {
                    neighbors[n] = labels[above + x - 1];
                    n += 1;
                }
                if mask.get(x, y - 1) {
                    neighbors[n] = labels[above + x];
                    n += 1;
                }
                if x + 1 < width && mask.get(x + 1, y - 1) {
                    neighbors[n] = labels[above + x + 1];
                    n += 1;
                }
            }

            let idx = y * width + x;
            match neighbors[..n].iter().copied().min() {
                None => {
                    labels[idx] = next_label;
                    next_label += 1;
                }
                Some(min_label) => {
                    labels[idx] = min_label;
                    for &l in &neighbors[..n] {
                        if l != min_label {
                            uf.union(min_label, l);
                        }
                    }
                }
            }
        }
    }

    // Compute bounding boxes as (min_x, min_y, max_x, max_y)
    let mut bboxes: HashMap<u32, (usize, usize, usize, usize)> = HashMap::new();
    for y in 0..height {
        for x in 0..width {
            let label = labels[y * width + x];
            if label == 0 {
                continue;
            }
            let root = uf.find(label);
            let entry = bboxes.entry(root).or_insert((x, y, x, y));
            entry.0 = entry.0.min(x);
            entry.1 = entry.1.min(y);
            entry.2 = entry.2.max(x);
            entry.3 = entry.3.max(y);
        }
    }

    let mut rects: Vec<CropRect> = bboxes
        .values()
        .map(|&(x0, y0, x1, y1)| {
            CropRect::new(x0 as i32, y0 as i32, (x1 - x0 + 1) as i32, (y1 - y0 + 1) as i32)
        })
        .collect();
    // Deterministic order: top-to-bottom, left-to-right
    rects.sort_by_key(|r| (r.y0, r.x0));
    rects
}

fn contains(outer: &CropRect, inner: &CropRect) -> bool {
    outer != inner
        && outer.x0 <= inner.x0
        && outer.y0 <= inner.y0
        && outer.right() >= inner.right()
        && outer.bottom() >= inner.bottom()
}

/// Bounding rectangles of outermost contours only.
///
/// Components nested inside another component's box (finder-pattern cores,
/// module islands) are dropped.
pub fn external_bounds(mask: &BinaryMask) -> Vec<CropRect> {
    let all = component_bounds(mask);
    all.iter()
        .filter(|r| !all.iter().any(|outer| contains(outer, r)))
        .copied()
        .collect()
}

/// Keep rectangles larger than `min_size` on both sides and within
/// `tolerance` pixels of square
pub fn square_candidates(rects: &[CropRect], min_size: u32, tolerance: u32) -> Vec<CropRect> {
    rects
        .iter()
        .filter(|r| r.width > min_size as i32 && r.height > min_size as i32)
        .filter(|r| (r.width - r.height).unsigned_abs() <= tolerance)
        .copied()
        .collect()
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
    fn test_find_black_regions() {
        let mut mask = BinaryMask::new(10, 10);
        // Create 2x2 black square at (2,2)
        fill(&mut mask, 2, 2, 2, 2);

        let regions = component_bounds(&mask);
        assert_eq!(regions, vec![CropRect::new(2, 2, 2, 2)]);
    }

    #[test]
    fn test_diagonal_pixels_connect() {
        let mut mask = BinaryMask::new(6, 6);
        mask.set(1, 1, true);
        mask.set(2, 2, true);
        mask.set(3, 1, true);
        let regions = component_bounds(&mask);
        assert_eq!(regions, vec![CropRect::new(1, 1, 3, 2)]);
    }

    #[test]
    fn test_u_shape_merges() {
        // Two arms joined at the bottom get separate labels first
        let mut mask = BinaryMask::new(7, 5);
        fill(&mut mask, 0, 0, 1, 5);
        fill(&mut mask, 6, 0, 1, 5);
        fill(&mut mask, 0, 4, 7, 1);
        assert_eq!(component_bounds(&mask), vec![CropRect::new(0, 0, 7, 5)]);
    }

    #[test]
    fn test_external_drops_nested() {
        let mut mask = BinaryMask::new(20, 20);
        // Hollow frame with a solid core inside
        fill(&mut mask, 2, 2, 14, 1);
        fill(&mut mask, 2, 15, 14, 1);
        fill(&mut mask, 2, 2, 1, 14);
        fill(&mut mask, 15, 2, 1, 14);
        fill(&mut mask, 7, 7, 4, 4);
        assert_eq!(component_bounds(&mask).len(), 2);
        assert_eq!(external_bounds(&mask), vec![CropRect::new(2, 2, 14, 14)]);
    }

    #[test]
    fn test_square_candidates() {
        let rects = [
            CropRect::new(0, 0, 120, 130),
            CropRect::new(0, 0, 120, 150),
            CropRect::new(0, 0, 100, 100),
            CropRect::new(0, 0, 101, 101),
        ];
        let kept = square_candidates(&rects, 100, 20);
        assert_eq!(kept, vec![rects[0], rects[3]]);
    }
}
