//! Body measurements and general metric tracking.

use serde::{Deserialize, Serialize};
use crate::id::{MetricId, UserId};
use crate::progress::{initial_percent, Direction, Trend};
use crate::Time;

/// A body measurement series (weight, body fat, waist...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyMetric {
    /// Unique identifier
    pub id: MetricId,

    /// Owner
    pub user_id: UserId,

    /// What is measured
    pub kind: BodyMetricKind,

    /// Measurement unit
    pub unit: String,

    /// Latest measurement
    pub value: f64,

    /// Measurement before the latest one
    pub previous_value: Option<f64>,

    /// First measurement, the progress baseline
    pub baseline_value: Option<f64>,

    /// Target measurement
    pub target_value: Option<f64>,

    /// Which way counts as progress
    pub direction: Direction,

    /// Cached completion percentage (0-100)
    pub progress: f64,

    /// Sticky flag, set once the target is reached
    pub target_reached: bool,

    /// When the target was first reached
    pub reached_at: Option<Time>,

    /// When the latest value was measured
    pub recorded_at: Time,
}

impl BodyMetric {
    /// Start a series from a first measurement.
    pub fn new(user_id: UserId, kind: BodyMetricKind, unit: impl Into<String>, value: f64, now: Time) -> Self {
        Self {
            id: MetricId::new(),
            user_id,
            kind,
            unit: unit.into(),
            value,
            previous_value: None,
            baseline_value: Some(value),
            target_value: None,
            direction: kind.default_direction(),
            progress: initial_percent(value, None, value, kind.default_direction()),
            target_reached: false,
            reached_at: None,
            recorded_at: now,
        }
    }

    /// Set a target.
    pub fn with_target(mut self, target: f64) -> Self {
        self.target_value = Some(target);
        self.progress = initial_percent(
            self.value,
            self.target_value,
            self.baseline_value.unwrap_or(self.value),
            self.direction,
        );
        self
    }
}

/// Kinds of body measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyMetricKind {
    /// Body weight
    Weight,
    /// Body fat percentage
    BodyFat,
    /// Lean muscle mass
    MuscleMass,
    /// Waist circumference
    Waist,
    /// Chest circumference
    Chest,
    /// Resting heart rate, beats per minute
    RestingHeartRate,
}

impl BodyMetricKind {
    /// The direction this measurement usually aims for.
    pub fn default_direction(&self) -> Direction {
        match self {
            BodyMetricKind::Weight
            | BodyMetricKind::BodyFat
            | BodyMetricKind::Waist
            | BodyMetricKind::RestingHeartRate => Direction::Decreasing,
            BodyMetricKind::MuscleMass => Direction::Increasing,
            BodyMetricKind::Chest => Direction::Stable,
        }
    }
}

impl std::str::FromStr for BodyMetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "weight" => Ok(BodyMetricKind::Weight),
            "body_fat" => Ok(BodyMetricKind::BodyFat),
            "muscle_mass" => Ok(BodyMetricKind::MuscleMass),
            "waist" => Ok(BodyMetricKind::Waist),
            "chest" => Ok(BodyMetricKind::Chest),
            "resting_heart_rate" | "rhr" => Ok(BodyMetricKind::RestingHeartRate),
            other => Err(format!("unknown body metric: {}", other)),
        }
    }
}

/// A free-form performance or health metric with a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricTracking {
    /// Unique identifier
    pub id: MetricId,

    /// Owner
    pub user_id: UserId,

    /// Metric name ("5k time", "sleep hours")
    pub name: String,

    /// Metric category
    pub metric_type: MetricType,

    /// Measurement unit
    pub unit: Option<String>,

    /// Latest value
    pub current_value: f64,

    /// Value before the latest one
    pub previous_value: Option<f64>,

    /// Progress baseline
    pub baseline_value: Option<f64>,

    /// Target value
    pub target_value: Option<f64>,

    /// Which way counts as progress
    pub direction: Direction,

    /// Cached completion percentage (0-100)
    pub progress: f64,

    /// Sticky flag, set once the target is met
    pub is_target_met: bool,

    /// When the target was first met
    pub met_at: Option<Time>,

    /// Movement of the latest reading
    pub trend: Trend,

    /// Last reading time
    pub last_recorded_at: Time,
}

impl MetricTracking {
    /// Start tracking from a baseline reading.
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        metric_type: MetricType,
        baseline: f64,
        target: Option<f64>,
        direction: Direction,
        now: Time,
    ) -> Self {
        Self {
            id: MetricId::new(),
            user_id,
            name: name.into(),
            metric_type,
            unit: None,
            current_value: baseline,
            previous_value: None,
            baseline_value: Some(baseline),
            target_value: target,
            direction,
            progress: initial_percent(baseline, target, baseline, direction),
            is_target_met: false,
            met_at: None,
            trend: Trend::Unchanged,
            last_recorded_at: now,
        }
    }
}

/// Metric category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Times, distances, loads
    Performance,
    /// Blood pressure, heart rate variability
    Health,
    /// Steps, active minutes
    Activity,
    /// Intake tracking
    Nutrition,
    /// Hours and quality
    Sleep,
}

impl std::str::FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "performance" => Ok(MetricType::Performance),
            "health" => Ok(MetricType::Health),
            "activity" => Ok(MetricType::Activity),
            "nutrition" => Ok(MetricType::Nutrition),
            "sleep" => Ok(MetricType::Sleep),
            other => Err(format!("unknown metric type: {}", other)),
        }
    }
}
