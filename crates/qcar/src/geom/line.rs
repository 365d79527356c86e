//! `Line2D`: directed segment with parametric intersection.

use serde::{Deserialize, Serialize};

use super::{point::Point2D, PARALLEL_EPS};

/// Segment from `p1` to `p2`. Parameter 0 is `p1`, parameter 1 is `p2`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line2D {
    pub p1: Point2D,
    pub p2: Point2D,
}

/// Result of intersecting the infinite lines through two segments.
///
/// Invariants:
/// - `t` and `u` are both `Some` or both `None`; `None` means parallel.
/// - `overlap` implies parallel: a collinear overlap has no single crossing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineOverlap {
    pub overlap: bool,
    /// Parameter along `self`.
    pub t: Option<f64>,
    /// Parameter along `other`.
    pub u: Option<f64>,
}

impl Line2D {
    #[inline]
    pub const fn new(p1: Point2D, p2: Point2D) -> Self {
        Self { p1, p2 }
    }

    #[inline]
    pub const fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Point2D::new(x1, y1), Point2D::new(x2, y2))
    }

    #[inline]
    pub fn direction(&self) -> Point2D {
        self.p2 - self.p1
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.direction().length()
    }

    /// Point at parameter `s` (0 → `p1`, 1 → `p2`).
    #[inline]
    pub fn point_at(&self, s: f64) -> Point2D {
        self.direction() * s + self.p1
    }

    /// Parameter of the orthogonal projection of `p` onto this line.
    /// `None` for a zero-length segment.
    pub fn project(&self, p: Point2D) -> Option<f64> {
        let d = self.direction().vec();
        let len_sq = d.norm_squared();
        if len_sq <= PARALLEL_EPS {
            return None;
        }
        Some((p - self.p1).vec().dot(&d) / len_sq)
    }

    /// Intersect the infinite lines through `self` and `other`.
    ///
    /// Parallel lines yield `t = u = None`. When the two segments are
    /// collinear and share at least one point, `overlap` is set; callers
    /// cannot use `t`/`u` in that case.
    pub fn line_overlap(&self, other: &Line2D) -> LineOverlap {
        let d1 = self.direction();
        let d2 = other.direction();
        let w = other.p1 - self.p1;
        let denom = cross(d1, d2);
        if denom.abs() <= PARALLEL_EPS {
            return LineOverlap {
                overlap: self.collinear_overlap(other),
                t: None,
                u: None,
            };
        }
        LineOverlap {
            overlap: false,
            t: Some(cross(w, d2) / denom),
            u: Some(cross(w, d1) / denom),
        }
    }

    fn collinear_overlap(&self, other: &Line2D) -> bool {
        let d1 = self.direction();
        if d1.length() <= PARALLEL_EPS {
            return false;
        }
        if cross(other.p1 - self.p1, d1).abs() > PARALLEL_EPS {
            return false;
        }
        let (Some(s0), Some(s1)) = (self.project(other.p1), self.project(other.p2)) else {
            return false;
        };
        s0.min(s1).max(0.0) <= s0.max(s1).min(1.0)
    }
}

#[inline]
fn cross(a: Point2D, b: Point2D) -> f64 {
    a.x * b.y - a.y * b.x
}
