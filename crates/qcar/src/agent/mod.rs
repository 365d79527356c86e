//! Tabular Q-learning over discretized sensor readings.
//!
//! Purpose
//! - Reduce a `SensorReading` to one of nine `StateLabel`s (front distance
//!   bucket × lateral bucket) and pick one of seven steering angles.
//! - Keep the value table a plain owned value (`QTable`) so the controller
//!   decides when it is loaded, updated and persisted.
//!
//! Pieces
//! - `states`: labels and bucketing.
//! - `actions`: index ↔ steering-angle table.
//! - `policy`: epsilon-greedy with uniform tie-breaking.
//! - `reward`: total reward function over (outcome, label, action).
//! - `table`: the Q-table, update rule and JSON persistence.

mod actions;
mod policy;
mod reward;
mod states;
mod table;

pub use actions::{angle_to_index, index_to_angle, ActionId, Steer, N_ACTIONS, STEERING_ANGLES};
pub use policy::{epsilon_greedy, greedy_action};
pub use reward::{reward, Outcome, RewardCfg};
pub use states::{DistanceBucket, LateralBucket, StateLabel, UnknownLabel};
pub use table::{QRow, QTable, TableError};

use serde::{Deserialize, Serialize};

use crate::cfg::ConfigError;

/// Learning hyper-parameters and bucketing thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentCfg {
    /// Learning rate.
    pub alpha: f64,
    /// Discount factor.
    pub gamma: f64,
    /// Front distance at or above which the state is `Far`.
    pub far_threshold: f64,
    /// Front distance at or above which the state is `Middle`.
    pub middle_threshold: f64,
    /// Half-width of the `Center` band on `right - left`.
    pub lateral_tolerance: f64,
}

impl Default for AgentCfg {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            far_threshold: 9.5,
            middle_threshold: 5.0,
            lateral_tolerance: 2.5,
        }
    }
}

impl AgentCfg {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(ConfigError::agent("alpha must lie in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::agent("gamma must lie in [0, 1]"));
        }
        if !(self.middle_threshold.is_finite() && self.far_threshold.is_finite()) {
            return Err(ConfigError::agent("distance thresholds must be finite"));
        }
        if self.middle_threshold > self.far_threshold {
            return Err(ConfigError::agent("middle_threshold <= far_threshold required"));
        }
        if !(self.lateral_tolerance >= 0.0) {
            return Err(ConfigError::agent("lateral_tolerance must be >= 0"));
        }
        Ok(())
    }
}
