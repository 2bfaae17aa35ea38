//! Geometric primitives in page space.
//!
//! Coordinates follow the PDF convention: origin at the bottom-left corner,
//! y increasing upward. Every type here is a plain `Copy` value.

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing floating point extents.
pub const EPSILON: f32 = 1e-3;

/// An axis-aligned rectangle anchored at its bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of the bottom-left corner
    pub x: f32,
    /// Y coordinate of the bottom-left corner
    pub y: f32,
    /// Width of rectangle
    pub width: f32,
    /// Height of rectangle
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from its bottom-left corner and dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use voter_slip::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// assert_eq!(rect.top(), 50.0);
    /// ```
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Left edge.
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y
    }

    /// Top edge.
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Check whether the interiors of two rectangles overlap.
    ///
    /// # Examples
    ///
    /// ```
    /// use voter_slip::geometry::Rect;
    ///
    /// let r1 = Rect::new(0.0, 0.0, 100.0, 100.0);
    /// let r2 = Rect::new(50.0, 50.0, 100.0, 100.0);
    /// let r3 = Rect::new(100.0, 0.0, 10.0, 10.0);
    ///
    /// assert!(r1.intersects(&r2));
    /// assert!(!r1.intersects(&r3));
    /// ```
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.bottom() < other.top()
            && self.top() > other.bottom()
    }

    /// Check if another rectangle lies fully inside this one, within [`EPSILON`].
    ///
    /// # Examples
    ///
    /// ```
    /// use voter_slip::geometry::Rect;
    ///
    /// let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
    /// assert!(outer.contains_rect(&Rect::new(10.0, 10.0, 90.0, 20.0)));
    /// assert!(!outer.contains_rect(&Rect::new(10.0, 10.0, 95.0, 20.0)));
    /// ```
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left() >= self.left() - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.bottom() >= self.bottom() - EPSILON
            && other.top() <= self.top() + EPSILON
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.left().min(other.left());
        let y0 = self.bottom().min(other.bottom());
        let x1 = self.right().max(other.right());
        let y1 = self.top().max(other.top());
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Shrink by `d` on every side. Never produces negative extents.
    pub fn inset(&self, d: f32) -> Rect {
        let width = (self.width - 2.0 * d).max(0.0);
        let height = (self.height - 2.0 * d).max(0.0);
        Rect::new(self.x + d, self.y + d, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.left(), 10.0);
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.bottom(), 20.0);
        assert_eq!(r.top(), 70.0);
    }

    #[test]
    fn test_touching_rects_do_not_intersect() {
        let r1 = Rect::new(0.0, 0.0, 10.0, 10.0);
        let r2 = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!r1.intersects(&r2));
        assert!(!r2.intersects(&r1));
    }

    #[test]
    fn test_union() {
        let r1 = Rect::new(0.0, 0.0, 50.0, 50.0);
        let r2 = Rect::new(25.0, 25.0, 50.0, 50.0);
        assert_eq!(r1.union(&r2), Rect::new(0.0, 0.0, 75.0, 75.0));
        assert_eq!(r2.union(&r1), r1.union(&r2));
    }

    #[test]
    fn test_inset_clamps() {
        let r = Rect::new(0.0, 0.0, 4.0, 10.0).inset(3.0);
        assert_eq!(r.width, 0.0);
        assert_eq!(r.height, 4.0);
    }
}
