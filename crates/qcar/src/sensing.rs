//! Ray-cast distance sensors and collision classification.
//!
//! One pass over the walls computes, for the current pose:
//! - whether the body touches a wall (endpoint within the radius, or the
//!   perpendicular foot strictly inside the segment and closer than the radius),
//! - whether the front ray lies collinear on a wall,
//! - every admissible intersection of the three sensor rays.
//!
//! A ray runs from the vehicle center through its anchor (front/right/left).
//! An intersection counts when it lies on the wall segment (`u ∈ [0, 1]`) and
//! strictly beyond the anchor (`t > 1`). A collinear overlap blinds that ray
//! for the whole pass.

use serde::Serialize;

use crate::geom::{Line2D, LineOverlap, Point2D};
use crate::track::Track;
use crate::vehicle::{Anchor, Vehicle};

/// Reading reported by a sensor that sees no wall.
pub const NO_READING: f64 = -1.0;

/// Distances from the vehicle center to the nearest wall along each ray.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SensorReading {
    pub front: f64,
    pub right: f64,
    pub left: f64,
}

impl SensorReading {
    pub const NONE: SensorReading = SensorReading {
        front: NO_READING,
        right: NO_READING,
        left: NO_READING,
    };
}

impl Default for SensorReading {
    fn default() -> Self {
        Self::NONE
    }
}

/// Outcome of one sensing pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Scan {
    pub reading: SensorReading,
    /// Terminal: destination reached or a wall touched.
    pub done: bool,
    /// Destination reached.
    pub complete: bool,
}

struct RayProbe {
    origin: Point2D,
    ray: Line2D,
    candidates: Vec<Point2D>,
    blinded: bool,
}

impl RayProbe {
    fn new(vehicle: &Vehicle, anchor: Anchor) -> Self {
        let origin = vehicle.position(anchor);
        Self {
            origin,
            ray: Line2D::new(vehicle.center(), origin),
            candidates: Vec::new(),
            blinded: false,
        }
    }

    fn offer(&mut self, wall: &Line2D, hit: LineOverlap) {
        if self.blinded {
            return;
        }
        if hit.overlap {
            self.candidates.clear();
            self.blinded = true;
            return;
        }
        if let (Some(t), Some(u)) = (hit.t, hit.u) {
            if (0.0..=1.0).contains(&u) && t > 1.0 {
                self.candidates.push(wall.point_at(u));
            }
        }
    }

    /// Distance from `center` to the candidate closest to the anchor.
    fn reading(&self, center: Point2D) -> f64 {
        self.candidates
            .iter()
            .min_by(|a, b| {
                a.dist_to_point(self.origin)
                    .total_cmp(&b.dist_to_point(self.origin))
            })
            .map_or(NO_READING, |p| p.dist_to_point(center))
    }
}

/// True when a disc of `radius` at `center` touches `wall`.
pub fn body_touches(center: Point2D, radius: f64, wall: &Line2D) -> bool {
    if center.dist_to_point(wall.p1) < radius || center.dist_to_point(wall.p2) < radius {
        return true;
    }
    let inside = wall.project(center).is_some_and(|s| s > 0.0 && s < 1.0);
    inside && center.dist_to_line(wall) < radius
}

/// Sense the track from the vehicle's current pose.
pub fn scan(vehicle: &Vehicle, track: &Track) -> Scan {
    let center = vehicle.center();
    let radius = vehicle.radius();
    let complete = track.is_at_destination(center);
    let mut done = complete;

    let mut front = RayProbe::new(vehicle, Anchor::Front);
    let mut right = RayProbe::new(vehicle, Anchor::Right);
    let mut left = RayProbe::new(vehicle, Anchor::Left);

    for wall in track.walls() {
        let front_hit = front.ray.line_overlap(wall);
        if front_hit.overlap || body_touches(center, radius, wall) {
            done = true;
        }
        front.offer(wall, front_hit);
        right.offer(wall, right.ray.line_overlap(wall));
        left.offer(wall, left.ray.line_overlap(wall));
    }

    Scan {
        reading: SensorReading {
            front: front.reading(center),
            right: right.reading(center),
            left: left.reading(center),
        },
        done,
        complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::VehicleCfg;

    fn car_at(x: f64, y: f64, angle: f64) -> Vehicle {
        let mut v = Vehicle::new(VehicleCfg::default());
        v.set_pose(Point2D::new(x, y), angle);
        v
    }

    fn track(walls: Vec<Line2D>) -> Track {
        Track::new(
            walls,
            (Point2D::new(100.0, 100.0), Point2D::new(110.0, 110.0)),
            None,
        )
    }

    #[test]
    fn empty_track_reads_sentinels() {
        let s = scan(&car_at(0.0, 0.0, 90.0), &track(Vec::new()));
        assert_eq!(s.reading, SensorReading::NONE);
        assert!(!s.done && !s.complete);
    }

    #[test]
    fn wall_behind_is_not_seen() {
        let s = scan(
            &car_at(0.0, 0.0, 90.0),
            &track(vec![Line2D::from_coords(-6.0, -3.0, 6.0, -3.0)]),
        );
        assert_eq!(s.reading.front, NO_READING);
        assert!(!s.done);
    }

    #[test]
    fn wall_ahead_is_measured_from_center() {
        let s = scan(
            &car_at(0.0, 0.0, 90.0),
            &track(vec![Line2D::from_coords(-20.0, 10.0, 20.0, 10.0)]),
        );
        assert!((s.reading.front - 10.0).abs() < 1e-9);
        let diag = 200f64.sqrt();
        assert!((s.reading.right - diag).abs() < 1e-9);
        assert!((s.reading.left - diag).abs() < 1e-9);
        assert!(!s.done);
    }

    #[test]
    fn hits_outside_the_wall_segment_are_ignored() {
        // Right ray crosses y = 10 at x = 10, past the wall's end.
        let s = scan(
            &car_at(0.0, 0.0, 90.0),
            &track(vec![Line2D::from_coords(-6.0, 10.0, 6.0, 10.0)]),
        );
        assert!((s.reading.front - 10.0).abs() < 1e-9);
        assert_eq!(s.reading.right, NO_READING);
        assert_eq!(s.reading.left, NO_READING);
    }

    #[test]
    fn nearest_of_several_walls_wins() {
        let walls = vec![
            Line2D::from_coords(-20.0, 30.0, 20.0, 30.0),
            Line2D::from_coords(-20.0, 12.0, 20.0, 12.0),
            Line2D::from_coords(-20.0, 50.0, 20.0, 50.0),
        ];
        let s = scan(&car_at(0.0, 0.0, 90.0), &track(walls));
        assert!((s.reading.front - 12.0).abs() < 1e-9);
    }

    #[test]
    fn side_wall_outside_radius_is_sensed_but_not_touched() {
        let s = scan(
            &car_at(0.0, 0.0, 90.0),
            &track(vec![Line2D::from_coords(4.0, -10.0, 4.0, 10.0)]),
        );
        assert!(!s.done);
        assert!((s.reading.right - 32f64.sqrt()).abs() < 1e-9);
        assert_eq!(s.reading.left, NO_READING);
        assert_eq!(s.reading.front, NO_READING);
    }

    #[test]
    fn body_and_endpoint_touches_end_the_episode() {
        let body = scan(
            &car_at(0.0, 0.0, 90.0),
            &track(vec![Line2D::from_coords(2.0, -10.0, 2.0, 10.0)]),
        );
        assert!(body.done && !body.complete);

        let endpoint = scan(
            &car_at(0.0, 0.0, 90.0),
            &track(vec![Line2D::from_coords(2.0, 1.0, 10.0, 1.0)]),
        );
        assert!(endpoint.done);

        // Foot of the perpendicular outside the segment and endpoints far away.
        let beside = scan(
            &car_at(0.0, 0.0, 90.0),
            &track(vec![Line2D::from_coords(2.0, 5.0, 2.0, 20.0)]),
        );
        assert!(!beside.done);
    }

    #[test]
    fn collinear_front_overlap_blinds_front_ray_and_terminates() {
        let along = Line2D::from_coords(0.0, 2.0, 0.0, 40.0);
        let ahead = Line2D::from_coords(-20.0, 30.0, 20.0, 30.0);
        for walls in [vec![along, ahead], vec![ahead, along]] {
            let s = scan(&car_at(0.0, 0.0, 90.0), &track(walls));
            assert!(s.done);
            assert_eq!(s.reading.front, NO_READING);
        }
    }

    #[test]
    fn center_in_destination_completes() {
        let t = Track::new(
            Vec::new(),
            (Point2D::new(18.0, 40.0), Point2D::new(30.0, 37.0)),
            None,
        );
        let s = scan(&car_at(20.0, 38.0, 90.0), &t);
        assert!(s.done && s.complete);
    }
}
