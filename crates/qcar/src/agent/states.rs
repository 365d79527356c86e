//! State labels: front-distance bucket × lateral bucket.

use std::fmt;
use std::str::FromStr;

use super::AgentCfg;
use crate::sensing::SensorReading;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DistanceBucket {
    Close,
    Middle,
    Far,
}

/// Which side has more room (`right - left` against the tolerance band).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LateralBucket {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateLabel {
    pub distance: DistanceBucket,
    pub lateral: LateralBucket,
}

impl StateLabel {
    pub const COUNT: usize = 9;

    /// Every label, in table order.
    pub const ALL: [StateLabel; Self::COUNT] = {
        use DistanceBucket::*;
        use LateralBucket::*;
        [
            Self::new(Close, Left),
            Self::new(Close, Center),
            Self::new(Close, Right),
            Self::new(Middle, Left),
            Self::new(Middle, Center),
            Self::new(Middle, Right),
            Self::new(Far, Left),
            Self::new(Far, Center),
            Self::new(Far, Right),
        ]
    };

    pub const fn new(distance: DistanceBucket, lateral: LateralBucket) -> Self {
        Self { distance, lateral }
    }

    /// Row index in the Q-table; inverse of `ALL[i]`.
    #[inline]
    pub const fn index(self) -> usize {
        self.distance as usize * 3 + self.lateral as usize
    }

    /// Bucket a reading. A front sentinel (no wall seen) falls into `Close`
    /// because the thresholds apply to the raw value.
    pub fn from_reading(reading: &SensorReading, cfg: &AgentCfg) -> Self {
        let distance = if reading.front >= cfg.far_threshold {
            DistanceBucket::Far
        } else if reading.front >= cfg.middle_threshold {
            DistanceBucket::Middle
        } else {
            DistanceBucket::Close
        };
        let diff = reading.right - reading.left;
        let lateral = if diff > cfg.lateral_tolerance {
            LateralBucket::Right
        } else if diff < -cfg.lateral_tolerance {
            LateralBucket::Left
        } else {
            LateralBucket::Center
        };
        Self::new(distance, lateral)
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = match self.distance {
            DistanceBucket::Close => "close",
            DistanceBucket::Middle => "middle",
            DistanceBucket::Far => "far",
        };
        let l = match self.lateral {
            LateralBucket::Left => "left",
            LateralBucket::Center => "center",
            LateralBucket::Right => "right",
        };
        write!(f, "{d}_{l}")
    }
}

/// A label string outside the nine known ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown state label {:?}", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

impl FromStr for StateLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownLabel(s.to_string());
        let (d, l) = s.split_once('_').ok_or_else(unknown)?;
        let distance = match d {
            "close" => DistanceBucket::Close,
            "middle" => DistanceBucket::Middle,
            "far" => DistanceBucket::Far,
            _ => return Err(unknown()),
        };
        let lateral = match l {
            "left" => LateralBucket::Left,
            "center" => LateralBucket::Center,
            "right" => LateralBucket::Right,
            _ => return Err(unknown()),
        };
        Ok(Self::new(distance, lateral))
    }
}
