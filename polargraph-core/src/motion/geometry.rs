//! Planar geometry
//!
//! Machine frame: origin at the left anchor, x toward the right anchor,
//! y pointing down from the anchor line.

use core::ops::Sub;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point in the machine frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The left anchor
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    /// Create a point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance from the origin
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Straight-line distance to another point
    pub fn distance_to(&self, other: Point) -> f64 {
        (*self - other).magnitude()
    }

    /// Check that both coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}
