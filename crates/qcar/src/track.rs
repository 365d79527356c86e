//! Corridor layout: wall segments, destination rectangle, optional start pose.
//!
//! Track file format (comma-separated numbers, one record per line):
//! 1. `x,y,angle` start pose
//! 2. first destination corner `x,y`
//! 3. opposite destination corner `x,y`
//! 4. first wall vertex `x,y`; every further line adds a vertex and closes a
//!    wall segment with the previous one.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::geom::{Line2D, Point2D};

/// Fixed start pose read from a track file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Pose {
    pub position: Point2D,
    /// Heading in degrees.
    pub angle: f64,
}

/// Immutable corridor description.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Track {
    walls: Vec<Line2D>,
    /// Destination rectangle given by two opposite corners.
    destination: (Point2D, Point2D),
    start: Option<Pose>,
}

impl Track {
    pub fn new(walls: Vec<Line2D>, destination: (Point2D, Point2D), start: Option<Pose>) -> Self {
        Self {
            walls,
            destination,
            start,
        }
    }

    /// The built-in L-shaped corridor.
    pub fn default_track() -> Self {
        let walls = vec![
            Line2D::from_coords(-6.0, -3.0, 6.0, -3.0),
            Line2D::from_coords(6.0, -3.0, 6.0, 10.0),
            Line2D::from_coords(6.0, 10.0, 30.0, 10.0),
            Line2D::from_coords(30.0, 10.0, 30.0, 50.0),
            Line2D::from_coords(18.0, 50.0, 30.0, 50.0),
            Line2D::from_coords(18.0, 22.0, 18.0, 50.0),
            Line2D::from_coords(-6.0, 22.0, 18.0, 22.0),
            Line2D::from_coords(-6.0, -3.0, -6.0, 22.0),
        ];
        Self::new(
            walls,
            (Point2D::new(18.0, 40.0), Point2D::new(30.0, 37.0)),
            None,
        )
    }

    #[inline]
    pub fn walls(&self) -> &[Line2D] {
        &self.walls
    }

    #[inline]
    pub fn destination(&self) -> (Point2D, Point2D) {
        self.destination
    }

    #[inline]
    pub fn start(&self) -> Option<Pose> {
        self.start
    }

    pub fn is_at_destination(&self, p: Point2D) -> bool {
        p.is_in_rect(self.destination.0, self.destination.1)
    }

    /// Parse the text form described in the module docs. Blank lines are skipped.
    pub fn parse(text: &str) -> Result<Self, TrackError> {
        let rows = text
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| parse_row(i + 1, l))
            .collect::<Result<Vec<_>, _>>()?;
        if rows.len() < 5 {
            return Err(TrackError::TooShort { records: rows.len() });
        }

        let pose = expect_arity(&rows[0], 3)?;
        let start = Pose {
            position: Point2D::new(pose[0], pose[1]),
            angle: pose[2],
        };
        let corner = |row: &Row| expect_arity(row, 2).map(|v| Point2D::new(v[0], v[1]));
        let destination = (corner(&rows[1])?, corner(&rows[2])?);
        let vertices = rows[3..].iter().map(corner).collect::<Result<Vec<_>, _>>()?;
        let walls = vertices
            .windows(2)
            .map(|w| Line2D::new(w[0], w[1]))
            .collect();
        Ok(Self::new(walls, destination, Some(start)))
    }

    pub fn from_file(path: &Path) -> Result<Self, TrackError> {
        let text = fs::read_to_string(path).map_err(|e| TrackError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&text)
    }

    /// Load `path`, falling back to the built-in track on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(track) => {
                tracing::info!(
                    path = %path.display(),
                    walls = track.walls.len(),
                    "track loaded"
                );
                track
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "using default track");
                Self::default_track()
            }
        }
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::default_track()
    }
}

struct Row {
    line: usize,
    values: Vec<f64>,
}

fn parse_row(line: usize, text: &str) -> Result<Row, TrackError> {
    let values = text
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TrackError::Parse {
            line,
            reason: e.to_string(),
        })?;
    Ok(Row { line, values })
}

fn expect_arity(row: &Row, n: usize) -> Result<&[f64], TrackError> {
    if row.values.len() != n {
        return Err(TrackError::Parse {
            line: row.line,
            reason: format!("expected {n} values, found {}", row.values.len()),
        });
    }
    Ok(&row.values)
}

/// Why a track file could not be used.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    Io { path: String, reason: String },
    Parse { line: usize, reason: String },
    /// Pose, two destination corners and at least two wall vertices are needed.
    TooShort { records: usize },
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, reason } => write!(f, "cannot read track file {path}: {reason}"),
            Self::Parse { line, reason } => write!(f, "track file line {line}: {reason}"),
            Self::TooShort { records } => {
                write!(f, "track file has {records} records, need at least 5")
            }
        }
    }
}

impl std::error::Error for TrackError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "0,0,90\n18,40\n30,37\n-6,-3\n-6,22\n18,22\n\n18,50\n";

    #[test]
    fn parses_pose_destination_and_polyline() {
        let t = Track::parse(SAMPLE).unwrap();
        assert_eq!(
            t.start(),
            Some(Pose {
                position: Point2D::new(0.0, 0.0),
                angle: 90.0
            })
        );
        assert_eq!(
            t.destination(),
            (Point2D::new(18.0, 40.0), Point2D::new(30.0, 37.0))
        );
        assert_eq!(
            t.walls(),
            &[
                Line2D::from_coords(-6.0, -3.0, -6.0, 22.0),
                Line2D::from_coords(-6.0, 22.0, 18.0, 22.0),
                Line2D::from_coords(18.0, 22.0, 18.0, 50.0),
            ]
        );
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(
            Track::parse("0,0,90\n18,40\n30,x\n1,1\n2,2\n"),
            Err(TrackError::Parse { line: 3, .. })
        ));
        assert!(matches!(
            Track::parse("0,0\n18,40\n30,37\n1,1\n2,2\n"),
            Err(TrackError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            Track::parse("0,0,90\n18,40\n30,37\n1,1\n"),
            Err(TrackError::TooShort { records: 4 })
        ));
    }

    #[test]
    fn load_falls_back_to_default_track() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        assert_eq!(Track::load_or_default(&missing), Track::default_track());

        let broken = dir.path().join("broken.txt");
        fs::write(&broken, "garbage").unwrap();
        assert_eq!(Track::load_or_default(&broken), Track::default_track());

        let good = dir.path().join("good.txt");
        let mut f = fs::File::create(&good).unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        assert_eq!(Track::load_or_default(&good).walls().len(), 3);
    }

    #[test]
    fn default_track_destination() {
        let t = Track::default_track();
        assert_eq!(t.walls().len(), 8);
        assert!(t.is_at_destination(Point2D::new(20.0, 38.0)));
        assert!(!t.is_at_destination(Point2D::new(0.0, 0.0)));
    }
}
