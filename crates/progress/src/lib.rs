//! Progress Tracking
//!
//! One tracker for every entity that measures a value against a target:
//! achievements, fitness goals, body metrics and tracked metrics.

#![warn(missing_docs)]

pub mod subject;
pub mod tracker;
pub mod service;

pub use subject::ProgressSubject;
pub use forma_core::percent_complete;
pub use tracker::{NoTargetPolicy, ProgressConfig, ProgressTracker, ProgressUpdate};
pub use service::{GoalProgressService, RefreshReport, ServiceError};
