//! Pure geometry helpers shared by the presence engine.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Construct a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Geometric centre of the rectangle.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Whether both extents are finite and strictly positive.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Euclidean distance between two points. Identical points yield `0.0`.
#[inline]
#[must_use]
pub fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

/// Containment test, inclusive on all four edges.
#[inline]
#[must_use]
pub fn point_in_rect(p: (f32, f32), rect: &Rect) -> bool {
    p.0 >= rect.x && p.0 <= rect.right() && p.1 >= rect.y && p.1 <= rect.bottom()
}

/// AABB overlap test. Rectangles sharing only an edge count as overlapping,
/// matching the inclusive edges of [`point_in_rect`].
#[inline]
#[must_use]
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.x <= b.right() && b.x <= a.right() && a.y <= b.bottom() && b.y <= a.bottom()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_handles_identical_and_pythagorean_points() {
        assert_eq!(distance((3.0, 4.0), (3.0, 4.0)), 0.0);
        assert_eq!(distance((0.0, 0.0), (3.0, 4.0)), 5.0);
        assert_eq!(distance((400.0, 300.0), (436.0, 348.0)), 60.0);
    }

    #[test]
    fn containment_is_inclusive_on_every_edge() {
        let rect = Rect::new(500.0, 100.0, 300.0, 200.0);
        assert!(point_in_rect((500.0, 100.0), &rect));
        assert!(point_in_rect((800.0, 300.0), &rect));
        assert!(point_in_rect((500.0, 300.0), &rect));
        assert!(point_in_rect((650.0, 200.0), &rect));
        assert!(!point_in_rect((499.99, 200.0), &rect));
        assert!(!point_in_rect((650.0, 300.01), &rect));
    }

    #[test]
    fn overlap_detects_shared_edges_and_disjoint_pairs() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let touching = Rect::new(10.0, 0.0, 5.0, 5.0);
        let inside = Rect::new(2.0, 2.0, 2.0, 2.0);
        let apart = Rect::new(20.0, 20.0, 1.0, 1.0);
        assert!(rects_overlap(&a, &touching));
        assert!(rects_overlap(&a, &inside));
        assert!(rects_overlap(&inside, &a));
        assert!(!rects_overlap(&a, &apart));
    }

    #[test]
    fn well_formed_rejects_degenerate_extents() {
        assert!(Rect::new(0.0, 0.0, 1.0, 1.0).is_well_formed());
        assert!(!Rect::new(0.0, 0.0, 0.0, 1.0).is_well_formed());
        assert!(!Rect::new(0.0, 0.0, 1.0, -2.0).is_well_formed());
        assert!(!Rect::new(f32::NAN, 0.0, 1.0, 1.0).is_well_formed());
    }
}
