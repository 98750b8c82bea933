//! Pointer clamping to the image rectangle.

use crate::model::Point;

/// Inclusive pixel coordinates of the image rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBounds {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl ImageBounds {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Bounds of a `width` x `height` image: `(0, 0, width - 1, height - 1)`.
    pub fn from_size(width: u32, height: u32) -> Self {
        let last = |n: u32| i32::try_from(n).unwrap_or(i32::MAX).saturating_sub(1).max(0);
        Self::new(0, 0, last(width), last(height))
    }

    pub fn contains(&self, p: Point) -> bool {
        (self.x1..=self.x2).contains(&p.x) && (self.y1..=self.y2).contains(&p.y)
    }

    /// Snap a pointer position into the image.
    ///
    /// Outside the rectangle there are eight zones:
    ///
    /// ```text
    ///  1 |   2   | 3
    /// ===|=======|===
    ///  4 | image | 5
    /// ===|=======|===
    ///  6 |   7   | 8
    /// ```
    ///
    /// Each axis is snapped independently. Overshoot to the left or top lands
    /// one pixel inside (`x1 + 1`, `y1 + 1`); overshoot to the right or bottom
    /// lands on the edge (`x2`, `y2`).
    pub fn clamp(&self, p: Point) -> Point {
        let x = if p.x < self.x1 {
            self.x1 + 1
        } else if p.x > self.x2 {
            self.x2
        } else {
            p.x
        };
        let y = if p.y < self.y1 {
            self.y1 + 1
        } else if p.y > self.y2 {
            self.y2
        } else {
            p.y
        };
        Point::new(x, y)
    }
}
