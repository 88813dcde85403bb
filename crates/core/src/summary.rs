//! Derived workout summary.

use serde::{Deserialize, Serialize};
use crate::exercise::BestResult;
use crate::id::ExerciseId;
use crate::Time;

/// Session-level statistics, recomputed from the raw attempt history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    /// Actual exercise entries, repeats included
    pub total_exercises: usize,

    /// Distinct exercises
    pub unique_exercises: usize,

    /// Attempts across all exercises
    pub total_sets: usize,

    /// Sum of weight × repetitions
    pub total_volume: f64,

    /// Session length in whole minutes
    pub total_duration: i64,

    /// Calories across all attempts
    pub total_calories: f64,

    /// Mean form score (0-10)
    pub form_score: f64,

    /// Per-exercise roll-ups
    pub exercise_summaries: Vec<ExerciseSummary>,

    /// When last recomputed
    pub finalized_at: Option<Time>,
}

/// Per-exercise roll-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSummary {
    /// Exercise
    pub exercise_id: ExerciseId,
    /// Display name
    pub name: String,
    /// Number of attempts
    pub total_attempts: usize,
    /// Best attempt
    pub best_result: Option<BestResult>,
}
