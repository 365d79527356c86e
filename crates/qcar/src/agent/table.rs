//! Q-table: one row of action values per state label.
//!
//! Invariants
//! - Every label has a row of exactly `N_ACTIONS` values (fixed-size arrays
//!   indexed by `StateLabel::index`), so lookups cannot miss.
//! - On disk the table is a JSON object `{"close_left": [..7 numbers..], ...}`.
//!   Loading requires all nine labels with rows of the right length.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::actions::{ActionId, N_ACTIONS};
use super::states::StateLabel;

pub type QRow = [f64; N_ACTIONS];

/// Serialized shape: label string → row.
type RawTable = BTreeMap<String, Vec<f64>>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable", into = "RawTable")]
pub struct QTable {
    rows: [QRow; StateLabel::COUNT],
}

impl Default for QTable {
    fn default() -> Self {
        Self::zeros()
    }
}

impl QTable {
    pub fn zeros() -> Self {
        Self {
            rows: [[0.0; N_ACTIONS]; StateLabel::COUNT],
        }
    }

    #[inline]
    pub fn row(&self, label: StateLabel) -> &QRow {
        &self.rows[label.index()]
    }

    #[inline]
    pub fn row_mut(&mut self, label: StateLabel) -> &mut QRow {
        &mut self.rows[label.index()]
    }

    #[inline]
    pub fn get(&self, label: StateLabel, action: ActionId) -> f64 {
        self.row(label)[action]
    }

    pub fn max_value(&self, label: StateLabel) -> f64 {
        self.row(label)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// One-step Q-learning:
    /// `Q[prev][a] += alpha * (reward + gamma * max Q[next] - Q[prev][a])`.
    ///
    /// Returns the new value of `Q[prev][a]`.
    pub fn update(
        &mut self,
        prev: StateLabel,
        action: ActionId,
        reward: f64,
        next: StateLabel,
        alpha: f64,
        gamma: f64,
    ) -> f64 {
        let next_max = self.max_value(next);
        let cell = &mut self.row_mut(prev)[action];
        *cell += alpha * (reward + gamma * next_max - *cell);
        *cell
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateLabel, &QRow)> {
        StateLabel::ALL.into_iter().zip(self.rows.iter())
    }

    pub fn to_json(&self) -> Result<String, TableError> {
        serde_json::to_string_pretty(self).map_err(TableError::json)
    }

    pub fn from_json(text: &str) -> Result<Self, TableError> {
        serde_json::from_str(text).map_err(TableError::json)
    }

    /// Write the table to `path`, creating parent directories as needed.
    ///
    /// The JSON goes to a temp file in the same directory which is then
    /// renamed over `path`, so readers never see a half-written table.
    pub fn save(&self, path: &Path) -> Result<(), TableError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| TableError::io(path, e))?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| TableError::io(path, e))?;
        tmp.write_all(self.to_json()?.as_bytes())
            .map_err(|e| TableError::io(path, e))?;
        tmp.persist(path).map_err(|e| TableError::io(path, e.error))?;
        tracing::info!(path = %path.display(), "q-table saved");
        Ok(())
    }

    /// `Ok(None)` when `path` does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, TableError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TableError::io(path, e)),
        };
        let table = Self::from_json(&text)?;
        tracing::info!(path = %path.display(), "q-table loaded");
        Ok(Some(table))
    }

    /// Stored table if present, zeros otherwise. Malformed files are errors.
    pub fn load_or_zeros(path: &Path) -> Result<Self, TableError> {
        Ok(Self::load(path)?.unwrap_or_else(|| {
            tracing::info!(path = %path.display(), "no stored q-table, starting from zeros");
            Self::zeros()
        }))
    }
}

impl From<QTable> for RawTable {
    fn from(table: QTable) -> Self {
        table
            .iter()
            .map(|(label, row)| (label.to_string(), row.to_vec()))
            .collect()
    }
}

impl TryFrom<RawTable> for QTable {
    type Error = TableError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        let mut table = QTable::zeros();
        let mut seen = [false; StateLabel::COUNT];
        for (key, values) in raw {
            let label: StateLabel = key
                .parse()
                .map_err(|_| TableError::UnknownLabel { label: key.clone() })?;
            let row: QRow = values
                .as_slice()
                .try_into()
                .map_err(|_| TableError::RowLength {
                    label: key.clone(),
                    found: values.len(),
                })?;
            *table.row_mut(label) = row;
            seen[label.index()] = true;
        }
        if let Some(missing) = StateLabel::ALL.iter().find(|l| !seen[l.index()]) {
            return Err(TableError::MissingLabel {
                label: missing.to_string(),
            });
        }
        Ok(table)
    }
}

/// Errors surfaced while loading or saving a Q-table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    Io { path: String, reason: String },
    Json { reason: String },
    UnknownLabel { label: String },
    MissingLabel { label: String },
    RowLength { label: String, found: usize },
}

impl TableError {
    fn io(path: &Path, e: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    }

    fn json(e: serde_json::Error) -> Self {
        Self::Json {
            reason: e.to_string(),
        }
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, reason } => write!(f, "q-table file {path}: {reason}"),
            Self::Json { reason } => write!(f, "q-table is not valid: {reason}"),
            Self::UnknownLabel { label } => write!(f, "q-table has unknown state {label:?}"),
            Self::MissingLabel { label } => write!(f, "q-table lacks state {label:?}"),
            Self::RowLength { label, found } => write!(
                f,
                "q-table row {label:?} has {found} values, expected {N_ACTIONS}"
            ),
        }
    }
}

impl std::error::Error for TableError {}
