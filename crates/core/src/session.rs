//! Workout session aggregate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use crate::exercise::{ExerciseResult, ExerciseStatus, MeasurementType};
use crate::id::{ExerciseId, PlanId, SessionId, UserId};
use crate::summary::WorkoutSummary;
use crate::Time;

/// A workout session: the plan, what actually happened, and the roll-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSession {
    /// Unique identifier
    pub id: SessionId,

    /// Owner
    pub user_id: UserId,

    /// Plan this session was generated from
    pub plan_id: Option<PlanId>,

    /// Session name
    pub name: String,

    /// Lifecycle status
    pub status: SessionStatus,

    /// When the session is scheduled to begin
    pub scheduled_for: Option<Time>,

    /// When execution began
    pub start_time: Option<Time>,

    /// When execution ended
    pub end_time: Option<Time>,

    /// Planned sequence; fixed once the session exists
    pub planned_exercises: Vec<PlannedExercise>,

    /// Executed sequence
    pub actual_exercises: Vec<ActualExercise>,

    /// One result per distinct exercise attempted
    pub exercise_results: BTreeMap<ExerciseId, ExerciseResult>,

    /// Derived on finalize; never edited by hand
    pub summary: WorkoutSummary,

    /// Free text
    pub notes: Option<String>,

    /// When created
    pub created_at: Time,

    /// Last updated
    pub updated_at: Time,
}

impl WorkoutSession {
    /// A session that starts right away.
    pub fn new(user_id: UserId, name: impl Into<String>, planned: Vec<PlannedExercise>, now: Time) -> Self {
        Self {
            id: SessionId::new(),
            user_id,
            plan_id: None,
            name: name.into(),
            status: SessionStatus::Active,
            scheduled_for: None,
            start_time: Some(now),
            end_time: None,
            planned_exercises: planned,
            actual_exercises: Vec::new(),
            exercise_results: BTreeMap::new(),
            summary: WorkoutSummary::default(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A session scheduled for later; stays pending until started.
    pub fn scheduled(
        user_id: UserId,
        name: impl Into<String>,
        planned: Vec<PlannedExercise>,
        at: Time,
        now: Time,
    ) -> Self {
        let mut session = Self::new(user_id, name, planned, now);
        session.status = SessionStatus::Pending;
        session.scheduled_for = Some(at);
        session.start_time = None;
        session
    }

    /// Look up the planned slot with the given order.
    pub fn planned_slot(&self, order: u32) -> Option<&PlannedExercise> {
        self.planned_exercises.iter().find(|p| p.order == order)
    }
}

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Scheduled, not yet begun
    Pending,
    /// Being executed
    Active,
    /// Every exercise completed or skipped
    Completed,
    /// Cancelled by the user
    Abandoned,
}

impl SessionStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A slot in the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedExercise {
    /// Exercise
    pub exercise_id: ExerciseId,
    /// Display name
    pub name: String,
    /// Position in the plan (1-based)
    pub order: u32,
    /// Sets to perform
    pub target_sets: u32,
    /// Repetitions per set
    pub target_reps: Option<u32>,
    /// Seconds per set
    pub target_duration_seconds: Option<u32>,
    /// Rest between sets
    pub rest_seconds: u32,
    /// Measurement type
    pub measurement: MeasurementType,
}

impl PlannedExercise {
    /// A slot of `target_sets` × `target_reps`.
    pub fn new(exercise_id: ExerciseId, name: impl Into<String>, order: u32, target_sets: u32, target_reps: u32) -> Self {
        Self {
            exercise_id,
            name: name.into(),
            order,
            target_sets,
            target_reps: Some(target_reps),
            target_duration_seconds: None,
            rest_seconds: 90,
            measurement: MeasurementType::Weighted,
        }
    }

    /// Set the measurement type.
    pub fn measured_by(mut self, measurement: MeasurementType) -> Self {
        self.measurement = measurement;
        self
    }
}

/// A slot as executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualExercise {
    /// Exercise
    pub exercise_id: ExerciseId,
    /// Position in execution order (1-based)
    pub order: u32,
    /// Planned slot this execution fills, if any
    pub planned_order: Option<u32>,
    /// When begun
    pub start_time: Option<Time>,
    /// When finished
    pub end_time: Option<Time>,
    /// Status
    pub status: ExerciseStatus,
    /// Sets completed so far
    pub completed_sets: u32,
}

impl ActualExercise {
    /// Pending or in progress.
    pub fn is_open(&self) -> bool {
        !self.status.is_finished()
    }
}
