//! Forma core data models.
//!
//! Plain value objects for goals, metrics, achievements and workout
//! sessions, plus the primitives every engine leans on: the [`normalize`]
//! clamp, the [`Clock`] and the [`Notifier`] seam.

#![warn(missing_docs)]

// Core identities
mod id;
mod clock;
mod normalize;
mod notify;

// Progress-tracked entities
mod progress;
mod goal;
mod achievement;
mod metric;

// Workout sessions
mod exercise;
mod session;
mod summary;

// Re-exports
pub use id::*;
pub use clock::{Clock, SystemClock, FixedClock};
pub use normalize::normalize;
pub use notify::{LogNotifier, Milestone, Notifier};

pub use progress::{percent_complete, Direction, Trend};
pub use goal::{FitnessGoal, GoalType};
pub use achievement::{Achievement, AchievementCategory};
pub use metric::{BodyMetric, BodyMetricKind, MetricTracking, MetricType};

pub use exercise::{
    AttemptInput, BestResult, ExerciseAttempt, ExerciseResult, ExerciseStatus, MeasurementType,
};
pub use session::{ActualExercise, PlannedExercise, SessionStatus, WorkoutSession};
pub use summary::{ExerciseSummary, WorkoutSummary};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
