//! Workout Session Execution
//!
//! Runs a planned session: records attempts, tracks per-exercise results and
//! best performances, and rolls everything up into a summary on finalize.

#![warn(missing_docs)]

pub mod best;
pub mod engine;
pub mod error;
pub mod service;

pub use best::{compare_attempts, select_best};
pub use engine::{
    calculate_average_form_score, calculate_calories, calculate_duration, calculate_volume_load, can_transition,
    is_complete, validate_attempt, AttemptOutcome, FinalizeOutcome, SessionConfig, SessionEngine,
};
pub use error::{AttemptRejection, SessionError};
pub use service::{ServiceError, SessionService};
