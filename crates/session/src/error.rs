//! Session errors.

use forma_core::{ExerciseId, ExerciseStatus, SessionStatus};

/// Errors raised by the session engine. None are retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// An attempt that cannot be recorded
    #[error("invalid attempt for exercise {exercise_id}: {reason}")]
    InvalidAttempt {
        /// Targeted exercise
        exercise_id: ExerciseId,
        /// Why it was rejected
        reason: AttemptRejection,
    },

    /// A session status change the lifecycle does not allow
    #[error("invalid session transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status
        from: SessionStatus,
        /// Requested status
        to: SessionStatus,
    },

    /// An exercise status change that is not allowed
    #[error("invalid exercise transition for {exercise_id}: {from} -> {to}")]
    InvalidExerciseTransition {
        /// Targeted exercise
        exercise_id: ExerciseId,
        /// Current status
        from: ExerciseStatus,
        /// Requested status
        to: ExerciseStatus,
    },

    /// The exercise is neither planned nor registered in the session
    #[error("exercise not part of this session: {0}")]
    UnknownExercise(ExerciseId),
}

/// Reasons an attempt is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttemptRejection {
    /// Session is not being executed
    #[error("session is {0}, not active")]
    SessionNotActive(SessionStatus),

    /// The exercise was skipped
    #[error("exercise was skipped")]
    ExerciseSkipped,

    /// Duration below zero or not a number
    #[error("duration must be a non-negative number, got {0}")]
    InvalidDuration(f64),

    /// Form score outside 0-10
    #[error("form score must be within 0-10, got {0}")]
    FormScoreOutOfRange(f64),

    /// Weight below zero or not a number
    #[error("weight must be a non-negative number, got {0}")]
    InvalidWeight(f64),

    /// Calories below zero or not a number
    #[error("calories must be a non-negative number, got {0}")]
    InvalidCalories(f64),

    /// Unplanned exercises are disabled
    #[error("exercise is not in the plan")]
    Unplanned,
}
