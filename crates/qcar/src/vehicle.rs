//! Disc-shaped vehicle with a bicycle-style kinematic update.
//!
//! Angles are degrees throughout. The heading lives in a circular window of
//! width 360 (default bounds -90 / 270); steering is clamped to the wheel
//! range. One `tick()` advances the vehicle by a unit step.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cfg::ConfigError;
use crate::geom::Point2D;

/// Vehicle geometry and limits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleCfg {
    pub diameter: f64,
    pub angle_min: f64,
    pub angle_max: f64,
    pub wheel_min: f64,
    pub wheel_max: f64,
    /// Start line extent; the reset interval is inset by the radius on both sides.
    pub start_x_min: f64,
    pub start_x_max: f64,
}

impl Default for VehicleCfg {
    fn default() -> Self {
        Self {
            diameter: 6.0,
            angle_min: -90.0,
            angle_max: 270.0,
            wheel_min: -40.0,
            wheel_max: 40.0,
            start_x_min: -4.5,
            start_x_max: 4.5,
        }
    }
}

impl VehicleCfg {
    #[inline]
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    /// Reject configurations the kinematic update cannot handle.
    ///
    /// `tick()` evaluates `asin(2·sin(steer)/diameter)`; the argument must stay
    /// within [-1, 1] for every admissible steering angle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.diameter.is_finite() && self.diameter > 0.0) {
            return Err(ConfigError::vehicle("diameter must be finite and > 0"));
        }
        if !(self.wheel_min <= self.wheel_max) {
            return Err(ConfigError::vehicle("wheel_min <= wheel_max required"));
        }
        if !(self.angle_min.is_finite() && self.angle_max.is_finite()) {
            return Err(ConfigError::vehicle("heading bounds must be finite"));
        }
        // `wrap_angle` folds from [0, 360), so the upper bound must sit there.
        if !(0.0..360.0).contains(&self.angle_max) {
            return Err(ConfigError::vehicle("angle_max must lie in [0, 360)"));
        }
        if ((self.angle_max - self.angle_min) - 360.0).abs() > 1e-9 {
            return Err(ConfigError::vehicle(
                "heading window must span exactly 360 degrees",
            ));
        }
        if !(self.start_x_min <= self.start_x_max) {
            return Err(ConfigError::vehicle("start_x_min <= start_x_max required"));
        }
        let worst = self.wheel_min.abs().max(self.wheel_max.abs()).min(90.0);
        let ratio = 2.0 * worst.to_radians().sin() / self.diameter;
        if ratio.abs() > 1.0 {
            return Err(ConfigError::vehicle(format!(
                "turning term 2*sin({worst})/{} = {ratio:.3} is outside asin domain",
                self.diameter
            )));
        }
        Ok(())
    }
}

/// Reference points on the vehicle body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Anchor {
    Center,
    Front,
    Right,
    Left,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Vehicle {
    cfg: VehicleCfg,
    /// Heading in degrees.
    pub angle: f64,
    /// Steering deflection in degrees.
    pub wheel_angle: f64,
    pub x: f64,
    pub y: f64,
}

impl Vehicle {
    /// Vehicle at the origin facing forward. Callers validate `cfg` first.
    pub fn new(cfg: VehicleCfg) -> Self {
        Self {
            cfg,
            angle: 90.0,
            wheel_angle: 0.0,
            x: 0.0,
            y: 0.0,
        }
    }

    #[inline]
    pub fn cfg(&self) -> &VehicleCfg {
        &self.cfg
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.cfg.radius()
    }

    /// Back to the start line: heading 90, wheel straight, y = 0 and x drawn
    /// uniformly from the inset start interval.
    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        self.angle = 90.0;
        self.wheel_angle = 0.0;
        let lo = self.cfg.start_x_min + self.radius();
        let hi = self.cfg.start_x_max - self.radius();
        self.x = if lo < hi {
            rng.gen_range(lo..hi)
        } else {
            0.5 * (self.cfg.start_x_min + self.cfg.start_x_max)
        };
        self.y = 0.0;
    }

    /// Set steering; out-of-range requests saturate at the nearest bound.
    pub fn set_wheel_angle(&mut self, angle: f64) {
        self.wheel_angle = angle.clamp(self.cfg.wheel_min, self.cfg.wheel_max);
    }

    /// Set heading, folded into the canonical window.
    pub fn set_angle(&mut self, new_angle: f64) {
        self.angle = self.wrap_angle(new_angle);
    }

    /// Wrap modulo 360 first, then shift down by the window width if above
    /// `angle_max`. The order matters: it decides which endpoint is included.
    pub fn wrap_angle(&self, angle: f64) -> f64 {
        let mut a = angle.rem_euclid(360.0);
        if a > self.cfg.angle_max {
            a -= self.cfg.angle_max - self.cfg.angle_min;
        }
        a
    }

    pub fn set_position(&mut self, p: Point2D) {
        self.x = p.x;
        self.y = p.y;
    }

    pub fn set_pose(&mut self, p: Point2D, angle: f64) {
        self.set_position(p);
        self.set_angle(angle);
    }

    pub fn position(&self, anchor: Anchor) -> Point2D {
        let center = Point2D::new(self.x, self.y);
        let half = self.radius();
        match anchor {
            Anchor::Center => center,
            Anchor::Right => center + Point2D::new(half, 0.0).rotate(self.angle - 45.0),
            Anchor::Left => center + Point2D::new(half, 0.0).rotate(self.angle + 45.0),
            Anchor::Front => {
                let rad = self.angle.to_radians();
                Point2D::new(rad.cos() * half + self.x, rad.sin() * half + self.y)
            }
        }
    }

    #[inline]
    pub fn center(&self) -> Point2D {
        self.position(Anchor::Center)
    }

    /// Advance one step.
    ///
    /// heading' = heading − asin(2·sin(steer)/diameter)
    /// x' = x + cos(heading+steer) + sin(steer)·sin(heading)
    /// y' = y + sin(heading+steer) − sin(steer)·cos(heading)
    pub fn tick(&mut self) {
        let car = self.angle.to_radians();
        let wheel = self.wheel_angle.to_radians();
        let new_x = self.x + (car + wheel).cos() + wheel.sin() * car.sin();
        let new_y = self.y + (car + wheel).sin() - wheel.sin() * car.cos();
        let turn = (2.0 * wheel.sin() / self.cfg.diameter).asin();
        let new_angle = self.wrap_angle((car - turn).to_degrees());

        self.x = new_x;
        self.y = new_y;
        self.set_angle(new_angle);
    }
}
