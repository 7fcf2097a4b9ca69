//! Golden-ratio spiral layout.
//!
//! Node `n` sits at angle `n * GOLDEN_ANGLE` and radius
//! `BASE_SCALE * PHI^(n / 2)`. The radius grows strictly with `n`, so the
//! spiral never folds back onto itself.

use serde::{Deserialize, Serialize};

/// The golden ratio `(1 + √5) / 2`.
pub const PHI: f64 = 1.618_033_988_749_895;

/// Angular step between consecutive nodes, in radians (~137.5°).
pub const GOLDEN_ANGLE: f64 = 2.399;

/// Radius of node 0, in canvas units.
pub const BASE_SCALE: f64 = 50.0;

/// A point on the editor canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Mean of the given points, or `None` if there are none.
    pub fn centroid<I>(points: I) -> Option<Point>
    where
        I: IntoIterator<Item = Point>,
    {
        let (sum, count) = points
            .into_iter()
            .fold((Point::default(), 0usize), |(acc, n), p| {
                (Point::new(acc.x + p.x, acc.y + p.y), n + 1)
            });
        if count == 0 {
            return None;
        }
        Some(Point::new(sum.x / count as f64, sum.y / count as f64))
    }
}

/// Radius of spiral index `n`.
pub fn spiral_radius(n: usize) -> f64 {
    BASE_SCALE * PHI.powf(n as f64 / 2.0)
}

/// Position of spiral index `n`.
pub fn spiral_position(n: usize) -> Point {
    let theta = n as f64 * GOLDEN_ANGLE;
    let r = spiral_radius(n);
    Point::new(r * theta.cos(), r * theta.sin())
}
