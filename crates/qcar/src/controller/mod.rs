//! Episode controller: owns the track, the vehicle, the Q-table and the RNG.
//!
//! Mutation entry points are `reset`, `step`, `set_pose`, `load_track`,
//! `run_simulation`, `run_episode` and `train*`. Everything a front end needs
//! to draw (pose, readings, flags) is read through accessors.
//!
//! Once a scan reports a terminal pose, the scan is frozen until `reset`:
//! further steps neither move the vehicle nor recompute sensors.

use std::fmt;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::agent::{
    epsilon_greedy, index_to_angle, reward, ActionId, Outcome, QTable, StateLabel, TableError,
};
use crate::cfg::{ConfigError, SimCfg};
use crate::geom::Point2D;
use crate::sensing::{self, Scan, SensorReading};
use crate::track::Track;
use crate::vehicle::Vehicle;

/// Training schedule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainCfg {
    pub episodes: usize,
    /// Initial exploration rate.
    pub epsilon: f64,
    /// Exploration decays as `epsilon * exp(-decay * i / episodes)`.
    pub decay: f64,
    /// Episodes still running after this many steps are cut off as failures.
    pub max_steps: usize,
    /// Save the table every this many episodes (when a table path is set).
    pub checkpoint_every: Option<usize>,
    /// Fixed RNG seed; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for TrainCfg {
    fn default() -> Self {
        Self {
            episodes: 2000,
            epsilon: 0.99,
            decay: 4.0,
            max_steps: 2000,
            checkpoint_every: None,
            seed: None,
        }
    }
}

impl TrainCfg {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(ConfigError::train("epsilon must lie in [0, 1]"));
        }
        if !(self.decay.is_finite() && self.decay >= 0.0) {
            return Err(ConfigError::train("decay must be finite and >= 0"));
        }
        if self.max_steps == 0 {
            return Err(ConfigError::train("max_steps must be > 0"));
        }
        if self.checkpoint_every == Some(0) {
            return Err(ConfigError::train("checkpoint_every must be > 0"));
        }
        Ok(())
    }

    /// Exploration rate for episode `i` of `episodes`.
    pub fn epsilon_at(&self, epsilon0: f64, i: usize, episodes: usize) -> f64 {
        if episodes == 0 {
            return epsilon0;
        }
        epsilon0 * (-self.decay * i as f64 / episodes as f64).exp()
    }
}

/// One decision: label before, chosen action, label and reading after.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Transition {
    #[serde(serialize_with = "as_display")]
    pub prev: StateLabel,
    pub action: ActionId,
    /// Steering angle of `action`, degrees.
    pub angle: f64,
    #[serde(serialize_with = "as_display")]
    pub next: StateLabel,
    pub reward: f64,
    pub reading: SensorReading,
    pub done: bool,
    pub complete: bool,
}

fn as_display<S: serde::Serializer>(label: &StateLabel, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(label)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EpisodeReport {
    pub steps: usize,
    pub complete: bool,
    /// Stopped by the step cap rather than by a terminal pose.
    pub truncated: bool,
    pub cumulative_reward: f64,
    pub epsilon: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TrainReport {
    pub episodes: usize,
    pub successes: usize,
    /// Episodes that ended without reaching the destination.
    pub failures: usize,
    pub final_epsilon: f64,
    /// Stopped early by the episode callback.
    pub interrupted: bool,
}

/// Errors from building a `Playground`.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    Config(ConfigError),
    Table(TableError),
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<TableError> for SimError {
    fn from(e: TableError) -> Self {
        Self::Table(e)
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::Table(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SimError {}

pub struct Playground {
    cfg: SimCfg,
    track: Track,
    vehicle: Vehicle,
    table: QTable,
    /// Where the table is persisted on success and at checkpoints.
    table_path: Option<PathBuf>,
    rng: StdRng,
    scan: Scan,
    failures: usize,
    cumulative_reward: f64,
}

impl Playground {
    /// Validate `cfg` and place the vehicle on the start line.
    pub fn new(cfg: SimCfg, track: Track, table: QTable) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let rng = cfg
            .train
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let mut pg = Self {
            vehicle: Vehicle::new(cfg.vehicle),
            cfg,
            track,
            table,
            table_path: None,
            rng,
            scan: Scan::default(),
            failures: 0,
            cumulative_reward: 0.0,
        };
        pg.reset();
        Ok(pg)
    }

    /// Like `new`, loading the table from `table_path` (zeros if absent) and
    /// persisting back to it.
    pub fn open(cfg: SimCfg, track: Track, table_path: &Path) -> Result<Self, SimError> {
        let table = QTable::load_or_zeros(table_path)?;
        Ok(Self::new(cfg, track, table)?.with_table_path(table_path))
    }

    pub fn with_table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.table_path = Some(path.into());
        self
    }

    pub fn cfg(&self) -> &SimCfg {
        &self.cfg
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn into_table(self) -> QTable {
        self.table
    }

    /// Latest sensor reading.
    #[inline]
    pub fn state(&self) -> SensorReading {
        self.scan.reading
    }

    #[inline]
    pub fn scan(&self) -> Scan {
        self.scan
    }

    #[inline]
    pub fn done(&self) -> bool {
        self.scan.done
    }

    #[inline]
    pub fn complete(&self) -> bool {
        self.scan.complete
    }

    /// Failed episodes in the current (or last) training run.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Reward collected since the last `reset`.
    pub fn cumulative_reward(&self) -> f64 {
        self.cumulative_reward
    }

    /// New episode: vehicle back on the start line (or the track's start pose).
    pub fn reset(&mut self) -> SensorReading {
        self.scan = Scan::default();
        self.cumulative_reward = 0.0;
        self.vehicle.reset(&mut self.rng);
        if let Some(pose) = self.track.start() {
            self.vehicle.set_pose(pose.position, pose.angle);
        }
        self.rescan();
        self.scan.reading
    }

    /// Swap in another track and start over on it.
    pub fn load_track(&mut self, track: Track) -> SensorReading {
        self.track = track;
        self.reset()
    }

    /// Place the vehicle explicitly. Ignored once the episode is terminal.
    pub fn set_pose(&mut self, position: Point2D, angle: f64) -> SensorReading {
        if !self.scan.done {
            self.vehicle.set_pose(position, angle);
            self.rescan();
        }
        self.scan.reading
    }

    /// Apply `steering` (if any) and advance one tick. No-op once terminal.
    pub fn step(&mut self, steering: Option<f64>) -> SensorReading {
        if !self.scan.done {
            if let Some(angle) = steering {
                self.vehicle.set_wheel_angle(angle);
            }
            self.vehicle.tick();
            self.rescan();
        }
        self.scan.reading
    }

    fn rescan(&mut self) {
        if !self.scan.done {
            self.scan = sensing::scan(&self.vehicle, &self.track);
        }
    }

    /// One decision and table update starting from `reading`.
    ///
    /// Returns `Ok(None)` when the episode is already over. Reaching the
    /// destination saves the table if a table path is set.
    pub fn run_simulation(
        &mut self,
        epsilon: f64,
        reading: SensorReading,
    ) -> Result<Option<Transition>, TableError> {
        if self.scan.done {
            return Ok(None);
        }
        let agent = self.cfg.agent;
        let prev = StateLabel::from_reading(&reading, &agent);
        let action = epsilon_greedy(self.table.row(prev), epsilon, &mut self.rng);
        let angle = index_to_angle(action);

        let after = self.step(Some(angle));
        let next = StateLabel::from_reading(&after, &agent);
        let r = reward(
            &self.cfg.reward,
            Outcome::of_scan(&self.scan),
            &after,
            next,
            action,
        );
        self.table
            .update(prev, action, r, next, agent.alpha, agent.gamma);
        self.cumulative_reward += r;

        if self.scan.complete {
            self.save_table()?;
        }
        Ok(Some(Transition {
            prev,
            action,
            angle,
            next,
            reward: r,
            reading: after,
            done: self.scan.done,
            complete: self.scan.complete,
        }))
    }

    /// Reset and run decisions until terminal or the step cap.
    pub fn run_episode(&mut self, epsilon: f64) -> Result<EpisodeReport, TableError> {
        let mut reading = self.reset();
        let mut steps = 0;
        while steps < self.cfg.train.max_steps {
            let Some(t) = self.run_simulation(epsilon, reading)? else {
                break;
            };
            reading = t.reading;
            steps += 1;
        }
        let report = EpisodeReport {
            steps,
            complete: self.scan.complete,
            truncated: !self.scan.done,
            cumulative_reward: self.cumulative_reward,
            epsilon,
        };
        if !report.complete {
            self.failures += 1;
        }
        tracing::debug!(
            steps,
            complete = report.complete,
            truncated = report.truncated,
            reward = report.cumulative_reward,
            epsilon,
            "episode"
        );
        Ok(report)
    }

    /// Train for `episodes` episodes with decaying exploration from `epsilon0`.
    pub fn train(&mut self, episodes: usize, epsilon0: f64) -> Result<TrainReport, TableError> {
        self.train_with(episodes, epsilon0, |_, _| ControlFlow::Continue(()))
    }

    /// `train` with a callback after every episode; `Break` stops training
    /// before the next episode starts.
    pub fn train_with<F>(
        &mut self,
        episodes: usize,
        epsilon0: f64,
        mut on_episode: F,
    ) -> Result<TrainReport, TableError>
    where
        F: FnMut(usize, &EpisodeReport) -> ControlFlow<()>,
    {
        self.failures = 0;
        let mut report = TrainReport {
            final_epsilon: epsilon0,
            ..TrainReport::default()
        };
        for i in 0..episodes {
            let epsilon = self.cfg.train.epsilon_at(epsilon0, i, episodes);
            let episode = self.run_episode(epsilon)?;
            report.episodes += 1;
            report.final_epsilon = epsilon;
            if episode.complete {
                report.successes += 1;
            }
            if let Some(every) = self.cfg.train.checkpoint_every {
                if (i + 1) % every == 0 {
                    if let Err(err) = self.save_table() {
                        tracing::warn!(%err, episode = i, "checkpoint not saved");
                    }
                }
            }
            if on_episode(i, &episode).is_break() {
                report.interrupted = true;
                break;
            }
        }
        report.failures = self.failures;
        tracing::info!(
            episodes = report.episodes,
            successes = report.successes,
            failures = report.failures,
            final_epsilon = report.final_epsilon,
            interrupted = report.interrupted,
            "training finished"
        );
        Ok(report)
    }

    fn save_table(&self) -> Result<(), TableError> {
        match &self.table_path {
            Some(path) => self.table.save(path),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests;
