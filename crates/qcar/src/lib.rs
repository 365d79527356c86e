//! Corridor driving simulation with a tabular Q-learning agent.
//!
//! A disc-shaped vehicle drives through a corridor of wall segments, senses
//! the walls with three rays (front, right, left) and learns a steering policy
//! over nine discretized states and seven steering angles.
//!
//! Layout
//! - `geom`: points, segments, intersection and distance primitives.
//! - `vehicle`: kinematics and heading window.
//! - `track`: walls, destination rectangle, track files.
//! - `sensing`: ray readings and terminal classification.
//! - `agent`: state labels, actions, policy, reward, Q-table.
//! - `controller`: the `Playground` that runs episodes and training.
//! - `cfg`: aggregate configuration and its validation errors.
//!
//! API Policy
//! - Workspace-internal crate. The CLI is the only consumer; breaking changes
//!   are fine when they make the model clearer.

pub mod agent;
pub mod cfg;
pub mod controller;
pub mod geom;
pub mod sensing;
pub mod track;
pub mod vehicle;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cfg::{ConfigError, SimCfg};
pub use controller::{Playground, SimError};

/// Common exports for callers driving a simulation.
pub mod prelude {
    pub use crate::agent::{AgentCfg, QTable, RewardCfg, StateLabel, TableError};
    pub use crate::cfg::{ConfigError, SimCfg};
    pub use crate::controller::{
        EpisodeReport, Playground, SimError, TrainCfg, TrainReport, Transition,
    };
    pub use crate::geom::{Line2D, Point2D};
    pub use crate::sensing::{Scan, SensorReading, NO_READING};
    pub use crate::track::{Pose, Track, TrackError};
    pub use crate::vehicle::{Vehicle, VehicleCfg};
}
