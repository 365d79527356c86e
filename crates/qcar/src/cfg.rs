//! Simulation configuration.
//!
//! Policy
//! - Every knob has a default tuned for the built-in corridor; a JSON file
//!   only needs the fields it overrides (`#[serde(default)]` everywhere).
//! - Validation happens once, when a `Playground` is built, never per tick.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agent::{AgentCfg, RewardCfg};
use crate::controller::TrainCfg;
use crate::vehicle::VehicleCfg;

/// Aggregate configuration for a training or driving session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimCfg {
    pub vehicle: VehicleCfg,
    pub agent: AgentCfg,
    pub reward: RewardCfg,
    pub train: TrainCfg,
}

impl SimCfg {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.vehicle.validate()?;
        self.agent.validate()?;
        self.train.validate()
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: SimCfg = serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Invalid configuration, reported before any simulation state is built.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Vehicle { reason: String },
    Agent { reason: String },
    Train { reason: String },
    Parse { reason: String },
}

impl ConfigError {
    pub(crate) fn vehicle(reason: impl Into<String>) -> Self {
        Self::Vehicle {
            reason: reason.into(),
        }
    }

    pub(crate) fn agent(reason: impl Into<String>) -> Self {
        Self::Agent {
            reason: reason.into(),
        }
    }

    pub(crate) fn train(reason: impl Into<String>) -> Self {
        Self::Train {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vehicle { reason } => write!(f, "invalid vehicle config: {reason}"),
            Self::Agent { reason } => write!(f, "invalid agent config: {reason}"),
            Self::Train { reason } => write!(f, "invalid training config: {reason}"),
            Self::Parse { reason } => write!(f, "unreadable config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}
