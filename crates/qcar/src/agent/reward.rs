//! Reward function.
//!
//! Terminal transitions pay `success` or `collision`. Running transitions pay
//! a step cost (or a proximity penalty when a wall is near) plus a steering
//! term looked up from (label, direction). All lookups are exhaustive matches,
//! so every (state, action) pair has a defined reward.

use serde::{Deserialize, Serialize};

use super::actions::{ActionId, Steer};
use super::states::{DistanceBucket, LateralBucket, StateLabel};
use crate::sensing::{Scan, SensorReading};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardCfg {
    pub success: f64,
    pub collision: f64,
    /// Cost of a step with no wall nearby.
    pub step: f64,
    /// Cost of a step with a wall inside the safety distances (replaces `step`).
    pub proximity: f64,
    pub side_safety: f64,
    pub front_safety: f64,
    /// Scale of the steering term.
    pub steering: f64,
}

impl Default for RewardCfg {
    fn default() -> Self {
        Self {
            success: 1.0,
            collision: -1.0,
            step: -0.01,
            proximity: -0.08,
            side_safety: 5.0,
            front_safety: 4.5,
            steering: 0.02,
        }
    }
}

/// How a transition ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Running,
    Arrived,
    Crashed,
}

impl Outcome {
    pub fn of_scan(scan: &Scan) -> Self {
        match (scan.done, scan.complete) {
            (_, true) => Outcome::Arrived,
            (true, false) => Outcome::Crashed,
            (false, false) => Outcome::Running,
        }
    }
}

/// Reward for arriving in `label` with `reading` after taking `action`.
pub fn reward(
    cfg: &RewardCfg,
    outcome: Outcome,
    reading: &SensorReading,
    label: StateLabel,
    action: ActionId,
) -> f64 {
    match outcome {
        Outcome::Arrived => cfg.success,
        Outcome::Crashed => cfg.collision,
        Outcome::Running => {
            let base = if near_wall(cfg, reading) {
                cfg.proximity
            } else {
                cfg.step
            };
            base + cfg.steering * steering_score(label, Steer::of_action(action))
        }
    }
}

fn near_wall(cfg: &RewardCfg, reading: &SensorReading) -> bool {
    // Negative readings are the no-wall sentinel.
    let below = |d: f64, limit: f64| d >= 0.0 && d < limit;
    below(reading.right, cfg.side_safety)
        || below(reading.left, cfg.side_safety)
        || below(reading.front, cfg.front_safety)
}

/// +1 for steering toward the roomier side (or holding straight on a clear
/// centered lane), -1 for steering into the tighter side, 0 otherwise.
fn steering_score(label: StateLabel, steer: Steer) -> f64 {
    match (label.lateral, steer) {
        (LateralBucket::Right, Steer::Right) | (LateralBucket::Left, Steer::Left) => 1.0,
        (LateralBucket::Right, Steer::Left) | (LateralBucket::Left, Steer::Right) => -1.0,
        (LateralBucket::Right | LateralBucket::Left, Steer::Straight) => 0.0,
        (LateralBucket::Center, Steer::Straight) => match label.distance {
            DistanceBucket::Far | DistanceBucket::Middle => 1.0,
            DistanceBucket::Close => -1.0,
        },
        (LateralBucket::Center, Steer::Left | Steer::Right) => match label.distance {
            DistanceBucket::Far => -1.0,
            DistanceBucket::Middle => 0.0,
            DistanceBucket::Close => 1.0,
        },
    }
}
