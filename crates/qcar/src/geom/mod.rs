//! Planar geometry for the corridor: points, wall segments, intersections.
//!
//! Purpose
//! - Provide the small set of primitives the sensing pass needs: vector
//!   arithmetic, rotation in degrees, point-to-line distance, rectangle
//!   containment and parametric segment intersection.
//! - Keep degenerate cases explicit: parallel lines report no parameters
//!   instead of failing, collinear overlaps are flagged for the caller.
//!
//! Code cross-refs: `sensing::scan`, `vehicle::Vehicle::position`.

mod line;
mod point;

pub use line::{Line2D, LineOverlap};
pub use point::Point2D;

/// Cross products below this magnitude are treated as parallel.
pub(crate) const PARALLEL_EPS: f64 = 1e-12;
