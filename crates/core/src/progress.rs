//! Direction and trend primitives shared by every progress-tracked entity.

use serde::{Deserialize, Serialize};

use crate::normalize;

/// Which way a value has to move to count as "better".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Higher is better (strength, distance)
    #[default]
    Increasing,
    /// Lower is better (body weight, resting heart rate)
    Decreasing,
    /// Holding steady is the aim
    Stable,
}

impl Direction {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Increasing => "increasing",
            Direction::Decreasing => "decreasing",
            Direction::Stable => "stable",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "increasing" | "up" => Ok(Direction::Increasing),
            "decreasing" | "down" => Ok(Direction::Decreasing),
            "stable" => Ok(Direction::Stable),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// Percentage of the way from `start` to `target` that `current` has covered.
///
/// Always within [0, 100]. When `start` is already at or past the target the
/// result is 100, which also keeps the division away from zero.
pub fn percent_complete(current: f64, target: f64, start: f64, direction: Direction) -> f64 {
    let progress = match direction {
        Direction::Decreasing => {
            if start <= target {
                return 100.0;
            }
            (start - current) / (start - target) * 100.0
        }
        Direction::Increasing | Direction::Stable => {
            if target <= start {
                return 100.0;
            }
            (current - start) / (target - start) * 100.0
        }
    };
    normalize(progress, 0.0, 100.0)
}

/// Cached percentage for a freshly built entity. A missing target reads as
/// complete, the tracker's default policy.
pub(crate) fn initial_percent(current: f64, target: Option<f64>, start: f64, direction: Direction) -> f64 {
    target.map_or(100.0, |target| percent_complete(current, target, start, direction))
}

/// Movement between two consecutive observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Moved the "better" way
    Improving,
    /// Moved the "worse" way
    Declining,
    /// No movement
    #[default]
    Unchanged,
}

impl Trend {
    /// Classify the move from `previous` to `current`.
    ///
    /// For [`Direction::Stable`] the reference point is the target when one
    /// is set: getting closer is improving. Without a target any movement
    /// away from the previous value is declining.
    pub fn between(previous: f64, current: f64, direction: Direction, target: Option<f64>) -> Self {
        if current == previous {
            return Trend::Unchanged;
        }
        match direction {
            Direction::Increasing if current > previous => Trend::Improving,
            Direction::Increasing => Trend::Declining,
            Direction::Decreasing if current < previous => Trend::Improving,
            Direction::Decreasing => Trend::Declining,
            Direction::Stable => match target {
                Some(target) => {
                    let before = (previous - target).abs();
                    let after = (current - target).abs();
                    if after < before {
                        Trend::Improving
                    } else if after > before {
                        Trend::Declining
                    } else {
                        Trend::Unchanged
                    }
                }
                None => Trend::Declining,
            },
        }
    }
}
