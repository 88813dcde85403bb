//! Exercise attempts and per-exercise results within a session.

use serde::{Deserialize, Serialize};
use crate::id::ExerciseId;
use crate::Time;

/// Execution status of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseStatus {
    /// Not started
    Pending,
    /// At least one attempt recorded
    InProgress,
    /// Planned sets reached or marked done
    Completed,
    /// Bypassed; no further attempts accepted
    Skipped,
}

impl ExerciseStatus {
    /// Completed or skipped.
    pub fn is_finished(&self) -> bool {
        matches!(self, ExerciseStatus::Completed | ExerciseStatus::Skipped)
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseStatus::Pending => "pending",
            ExerciseStatus::InProgress => "in_progress",
            ExerciseStatus::Completed => "completed",
            ExerciseStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for ExerciseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an exercise is measured. Decides the secondary best-result criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementType {
    /// Load lifted (squat, bench)
    #[default]
    Weighted,
    /// Bodyweight repetitions (push-ups)
    Repetitions,
    /// Time under tension or distance work (plank, row)
    Duration,
}

impl std::str::FromStr for MeasurementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weighted" | "weight" => Ok(MeasurementType::Weighted),
            "repetitions" | "reps" => Ok(MeasurementType::Repetitions),
            "duration" | "time" => Ok(MeasurementType::Duration),
            other => Err(format!("unknown measurement type: {}", other)),
        }
    }
}

/// What the caller reports for a single set.
///
/// The engine stamps the attempt with the clock unless `performed_at` is
/// given (imports, offline sync).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptInput {
    /// Repetitions performed
    pub repetitions: u32,
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Technique score, 0-10
    pub form_score: f64,
    /// Load, if any
    pub weight: Option<f64>,
    /// Estimated energy expenditure
    pub calories: Option<f64>,
    /// Free text
    pub notes: Option<String>,
    /// Explicit timestamp
    pub performed_at: Option<Time>,
}

impl AttemptInput {
    /// An attempt of `repetitions` reps at `form_score`.
    pub fn reps(repetitions: u32, form_score: f64) -> Self {
        Self {
            repetitions,
            form_score,
            ..Default::default()
        }
    }

    /// Set the load.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Set the duration in seconds.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = seconds;
        self
    }

    /// Set the calories.
    pub fn with_calories(mut self, calories: f64) -> Self {
        self.calories = Some(calories);
        self
    }

    /// Pin the timestamp.
    pub fn at(mut self, performed_at: Time) -> Self {
        self.performed_at = Some(performed_at);
        self
    }
}

/// A recorded set. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseAttempt {
    /// When performed
    pub timestamp: Time,
    /// Repetitions performed
    pub repetitions: u32,
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Technique score, 0-10
    pub form_score: f64,
    /// Load, if any
    pub weight: Option<f64>,
    /// Estimated energy expenditure
    pub calories: Option<f64>,
    /// Free text
    pub notes: Option<String>,
}

impl ExerciseAttempt {
    /// Build an attempt from caller input, stamped at `timestamp`.
    pub fn from_input(input: AttemptInput, timestamp: Time) -> Self {
        Self {
            timestamp: input.performed_at.unwrap_or(timestamp),
            repetitions: input.repetitions,
            duration_seconds: input.duration_seconds,
            form_score: input.form_score,
            weight: input.weight,
            calories: input.calories,
            notes: input.notes,
        }
    }

    /// weight × repetitions, missing weight counting as zero.
    pub fn volume(&self) -> f64 {
        self.weight.unwrap_or(0.0) * f64::from(self.repetitions)
    }
}

/// The attempt judged best for an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestResult {
    /// 1-based position of the attempt in the history
    pub attempt_number: usize,
    /// When performed
    pub timestamp: Time,
    /// Repetitions performed
    pub repetitions: u32,
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Technique score
    pub form_score: f64,
    /// Load
    pub weight: Option<f64>,
}

impl BestResult {
    /// Snapshot of `attempt`, the `index`-th (0-based) in its history.
    pub fn from_attempt(index: usize, attempt: &ExerciseAttempt) -> Self {
        Self {
            attempt_number: index + 1,
            timestamp: attempt.timestamp,
            repetitions: attempt.repetitions,
            duration_seconds: attempt.duration_seconds,
            form_score: attempt.form_score,
            weight: attempt.weight,
        }
    }
}

/// All attempts at one exercise within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseResult {
    /// Exercise
    pub exercise_id: ExerciseId,

    /// Display name
    pub name: String,

    /// Measurement type
    pub measurement: MeasurementType,

    /// Status
    pub status: ExerciseStatus,

    /// Chronological attempt history
    pub attempts: Vec<ExerciseAttempt>,

    /// Cached best attempt
    pub best_result: Option<BestResult>,

    /// First attempt time
    pub started_at: Option<Time>,

    /// When completed or skipped
    pub finished_at: Option<Time>,
}

impl ExerciseResult {
    /// An empty, pending result.
    pub fn new(exercise_id: ExerciseId, name: impl Into<String>, measurement: MeasurementType) -> Self {
        Self {
            exercise_id,
            name: name.into(),
            measurement,
            status: ExerciseStatus::Pending,
            attempts: Vec::new(),
            best_result: None,
            started_at: None,
            finished_at: None,
        }
    }
}
