//! Planar geometry in floor-plan coordinate units.

use serde::{Deserialize, Serialize};

/// A point on the floor plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(b)
}

/// Bearing of the segment `a -> b` in degrees, measured from the +x axis
/// towards +y, in (-180, 180]. Returns `None` for a zero-length segment.
pub fn bearing(a: Point, b: Point) -> Option<f64> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    Some(dy.atan2(dx).to_degrees())
}

/// Signed change of heading from `incoming` to `outgoing`, normalized to (-180, 180].
///
/// Positive values rotate from +x towards +y. Whether that is a left or a right
/// turn depends on the orientation of the plan's y axis.
pub fn turn_angle(incoming: f64, outgoing: f64) -> f64 {
    let mut delta = (outgoing - incoming) % 360.0;
    if delta <= -180.0 {
        delta += 360.0;
    } else if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, or `None` when the iterator is empty.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first, first);
        for p in iter {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn centroid(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// True when either extent is zero or negative, or any corner is non-finite.
    pub fn is_degenerate(&self) -> bool {
        !self.min.is_finite()
            || !self.max.is_finite()
            || self.width() <= 0.0
            || self.height() <= 0.0
    }

    /// Whether `p` lies on or within the box inflated by `tolerance` on every side.
    pub fn contains(&self, p: Point, tolerance: f64) -> bool {
        p.x >= self.min.x - tolerance
            && p.x <= self.max.x + tolerance
            && p.y >= self.min.y - tolerance
            && p.y <= self.max.y + tolerance
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}
