//! `Point2D`: a coordinate that doubles as a 2D vector.

use std::ops::{Add, Mul, Sub};

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

use super::line::Line2D;

/// Point (or displacement) in the corridor plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn vec(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Euclidean norm when the point is read as a vector.
    #[inline]
    pub fn length(self) -> f64 {
        self.vec().norm()
    }

    /// Rotate about the origin by `angle` degrees (counterclockwise).
    pub fn rotate(self, angle: f64) -> Self {
        let rot = Rotation2::new(angle.to_radians());
        (rot * self.vec()).into()
    }

    #[inline]
    pub fn dist_to_point(self, other: Point2D) -> f64 {
        (self - other).length()
    }

    /// Perpendicular distance to the infinite line through `line`'s endpoints.
    ///
    /// A zero-length segment has no direction; the distance to its single
    /// point is returned instead.
    pub fn dist_to_line(self, line: &Line2D) -> f64 {
        let d = line.direction().vec();
        let len = d.norm();
        if len <= super::PARALLEL_EPS {
            return self.dist_to_point(line.p1);
        }
        let w = (self - line.p1).vec();
        (d.x * w.y - d.y * w.x).abs() / len
    }

    /// Closed axis-aligned rectangle test; corner order does not matter.
    pub fn is_in_rect(self, a: Point2D, b: Point2D) -> bool {
        let (x_lo, x_hi) = (a.x.min(b.x), a.x.max(b.x));
        let (y_lo, y_hi) = (a.y.min(b.y), a.y.max(b.y));
        (x_lo..=x_hi).contains(&self.x) && (y_lo..=y_hi).contains(&self.y)
    }
}

impl From<Vector2<f64>> for Point2D {
    #[inline]
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl Add for Point2D {
    type Output = Point2D;
    #[inline]
    fn add(self, rhs: Point2D) -> Self::Output {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;
    #[inline]
    fn sub(self, rhs: Point2D) -> Self::Output {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;
    #[inline]
    fn mul(self, k: f64) -> Self::Output {
        Point2D::new(self.x * k, self.y * k)
    }
}
