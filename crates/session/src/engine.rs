//! The session engine - executes a workout session against its plan.
//!
//! ```text
//! PENDING → ACTIVE → COMPLETED
//!              └──→ ABANDONED
//! ```
//!
//! Attempts accumulate per exercise; [`SessionEngine::finalize`] rebuilds the
//! summary from that history and completes the session once every executed
//! exercise is completed or skipped.

use std::collections::BTreeSet;
use std::sync::Arc;

use forma_core::{
    normalize, ActualExercise, AttemptInput, Clock, ExerciseAttempt, ExerciseId, ExerciseResult,
    ExerciseStatus, ExerciseSummary, MeasurementType, SessionStatus, SystemClock, Time,
    WorkoutSession, WorkoutSummary,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::best::select_best;
use crate::error::{AttemptRejection, SessionError};

/// Configuration for the session engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Accept exercises that are not in the plan
    pub allow_unplanned_exercises: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            allow_unplanned_exercises: true,
        }
    }
}

/// What recording an attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptOutcome {
    /// 1-based position of the attempt in the exercise history
    pub attempt_number: usize,
    /// The attempt became the exercise's best result
    pub is_best: bool,
    /// The attempt filled the planned set count of its slot
    pub slot_completed: bool,
    /// Status of the exercise afterwards
    pub exercise_status: ExerciseStatus,
}

/// Result of finalizing a session.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizeOutcome {
    /// The freshly computed summary
    pub summary: WorkoutSummary,
    /// Finalizing moved the session to COMPLETED
    pub completed: bool,
}

/// Whether the lifecycle allows moving from `from` to `to`.
pub fn can_transition(from: SessionStatus, to: SessionStatus) -> bool {
    matches!(
        (from, to),
        (SessionStatus::Pending, SessionStatus::Active)
            | (SessionStatus::Active, SessionStatus::Completed)
            | (SessionStatus::Active, SessionStatus::Abandoned)
    )
}

/// Check an attempt's fields before it touches the session.
pub fn validate_attempt(input: &AttemptInput) -> Result<(), AttemptRejection> {
    if !input.duration_seconds.is_finite() || input.duration_seconds < 0.0 {
        return Err(AttemptRejection::InvalidDuration(input.duration_seconds));
    }
    if !input.form_score.is_finite() || !(0.0..=10.0).contains(&input.form_score) {
        return Err(AttemptRejection::FormScoreOutOfRange(input.form_score));
    }
    if let Some(weight) = input.weight {
        if !weight.is_finite() || weight < 0.0 {
            return Err(AttemptRejection::InvalidWeight(weight));
        }
    }
    if let Some(calories) = input.calories {
        if !calories.is_finite() || calories < 0.0 {
            return Err(AttemptRejection::InvalidCalories(calories));
        }
    }
    Ok(())
}

/// Sum of weight × repetitions over every attempt.
pub fn calculate_volume_load(session: &WorkoutSession) -> f64 {
    all_attempts(session).map(ExerciseAttempt::volume).sum()
}

/// Mean form score over every attempt, 0 when nothing was attempted.
pub fn calculate_average_form_score(session: &WorkoutSession) -> f64 {
    let scores: Vec<f64> = all_attempts(session).map(|a| a.form_score).collect();
    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    normalize(mean, 0.0, 10.0)
}

/// Calories over every attempt that reported them.
pub fn calculate_calories(session: &WorkoutSession) -> f64 {
    all_attempts(session).filter_map(|a| a.calories).sum()
}

/// Session length in whole minutes.
///
/// Uses start and end time when both are known, else the previously
/// finalized duration, else 0.
pub fn calculate_duration(session: &WorkoutSession) -> i64 {
    match (session.start_time, session.end_time) {
        (Some(start), Some(end)) => ((end - start).num_seconds() as f64 / 60.0).round() as i64,
        _ if session.summary.total_duration > 0 => session.summary.total_duration,
        _ => 0,
    }
}

/// True iff at least one exercise was executed and every executed exercise
/// is completed or skipped.
pub fn is_complete(session: &WorkoutSession) -> bool {
    !session.actual_exercises.is_empty()
        && session.actual_exercises.iter().all(|a| a.status.is_finished())
}

fn all_attempts(session: &WorkoutSession) -> impl Iterator<Item = &ExerciseAttempt> {
    session.exercise_results.values().flat_map(|r| r.attempts.iter())
}

/// Executes workout sessions.
#[derive(Clone)]
pub struct SessionEngine {
    config: SessionConfig,
    clock: Arc<dyn Clock>,
}

impl Default for SessionEngine {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl SessionEngine {
    /// Create an engine reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            config: SessionConfig::default(),
            clock,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// PENDING → ACTIVE.
    pub fn start(&self, session: &mut WorkoutSession) -> Result<(), SessionError> {
        self.transition(session, SessionStatus::Active)
    }

    /// ACTIVE → ABANDONED.
    pub fn abandon(&self, session: &mut WorkoutSession) -> Result<(), SessionError> {
        self.transition(session, SessionStatus::Abandoned)
    }

    fn transition(&self, session: &mut WorkoutSession, to: SessionStatus) -> Result<(), SessionError> {
        let from = session.status;
        if !can_transition(from, to) {
            warn!("Rejected session transition {} -> {} for {}", from, to, session.id);
            return Err(SessionError::InvalidTransition { from, to });
        }

        let now = self.clock.now();
        match to {
            SessionStatus::Active => {
                session.start_time.get_or_insert(now);
            }
            SessionStatus::Completed | SessionStatus::Abandoned => {
                session.end_time.get_or_insert(now);
            }
            SessionStatus::Pending => {}
        }
        session.status = to;
        session.updated_at = now;

        info!("Session {} {} -> {}", session.id, from, to);
        Ok(())
    }

    /// Register an exercise that is not in the plan and open a slot for it.
    pub fn add_exercise(
        &self,
        session: &mut WorkoutSession,
        exercise_id: ExerciseId,
        name: impl Into<String>,
        measurement: MeasurementType,
    ) -> Result<(), SessionError> {
        ensure_active(session, exercise_id)?;
        if !self.config.allow_unplanned_exercises && !is_planned(session, exercise_id) {
            return Err(SessionError::InvalidAttempt {
                exercise_id,
                reason: AttemptRejection::Unplanned,
            });
        }
        session
            .exercise_results
            .entry(exercise_id)
            .or_insert_with(|| ExerciseResult::new(exercise_id, name, measurement));
        self.start_exercise(session, exercise_id)
    }

    /// Open the next execution slot for a known exercise.
    ///
    /// Reuses an open slot if there is one, otherwise binds the next unused
    /// planned slot, otherwise opens an unplanned repeat. A completed
    /// exercise stays completed and no slot is opened.
    pub fn start_exercise(&self, session: &mut WorkoutSession, exercise_id: ExerciseId) -> Result<(), SessionError> {
        ensure_active(session, exercise_id)?;
        let status = self.ensure_result(session, exercise_id)?.status;
        if status == ExerciseStatus::Skipped {
            return Err(SessionError::InvalidExerciseTransition {
                exercise_id,
                from: ExerciseStatus::Skipped,
                to: ExerciseStatus::InProgress,
            });
        }

        let now = self.clock.now();
        if status == ExerciseStatus::Completed {
            debug!("Exercise {} already done in session {}", exercise_id, session.id);
            return Ok(());
        }

        let index = match open_slot(session, exercise_id) {
            Some(index) => index,
            None => {
                let planned_order = next_unbound_plan(session, exercise_id);
                push_slot(session, exercise_id, planned_order)
            }
        };
        session.actual_exercises[index].start_time.get_or_insert(now);
        session.updated_at = now;

        debug!("Started exercise {} in session {}", exercise_id, session.id);
        Ok(())
    }

    /// Record one attempt (set) at an exercise.
    pub fn record_attempt(
        &self,
        session: &mut WorkoutSession,
        exercise_id: ExerciseId,
        input: AttemptInput,
    ) -> Result<AttemptOutcome, SessionError> {
        ensure_active(session, exercise_id)?;
        if let Err(reason) = validate_attempt(&input) {
            warn!("Rejected attempt for {}: {}", exercise_id, reason);
            return Err(SessionError::InvalidAttempt { exercise_id, reason });
        }
        let status = self.ensure_result(session, exercise_id)?.status;
        if status == ExerciseStatus::Skipped {
            return Err(SessionError::InvalidAttempt {
                exercise_id,
                reason: AttemptRejection::ExerciseSkipped,
            });
        }

        let now = self.clock.now();
        let attempt = ExerciseAttempt::from_input(input, now);

        // Fill the open slot, else the next planned one. Extra sets past the
        // plan, or after the exercise was marked done, land on the most
        // recent slot for the exercise.
        let index = if status == ExerciseStatus::Completed {
            last_slot(session, exercise_id)
        } else {
            open_slot(session, exercise_id)
                .or_else(|| {
                    next_unbound_plan(session, exercise_id).map(|order| push_slot(session, exercise_id, Some(order)))
                })
                .or_else(|| last_slot(session, exercise_id))
        }
        .unwrap_or_else(|| push_slot(session, exercise_id, None));

        let target_sets = session.actual_exercises[index]
            .planned_order
            .and_then(|order| session.planned_slot(order))
            .map(|p| p.target_sets);

        let slot = &mut session.actual_exercises[index];
        slot.completed_sets += 1;
        slot.start_time.get_or_insert(attempt.timestamp);
        let mut slot_completed = false;
        if slot.is_open() {
            slot.status = ExerciseStatus::InProgress;
            if target_sets.is_some_and(|target| slot.completed_sets >= target) {
                slot.status = ExerciseStatus::Completed;
                slot.end_time = Some(now);
                slot_completed = true;
            }
        }

        let plan_done = planned_slots_finished(session, exercise_id);
        let result = session
            .exercise_results
            .get_mut(&exercise_id)
            .ok_or(SessionError::UnknownExercise(exercise_id))?;

        result.started_at.get_or_insert(attempt.timestamp);
        result.attempts.push(attempt);
        result.best_result = select_best(&result.attempts, result.measurement);

        if result.status == ExerciseStatus::Pending {
            result.status = ExerciseStatus::InProgress;
        }
        if slot_completed && plan_done && result.status == ExerciseStatus::InProgress {
            result.status = ExerciseStatus::Completed;
            result.finished_at = Some(now);
            info!("Exercise {} completed in session {}", exercise_id, session.id);
        }

        let attempt_number = result.attempts.len();
        let outcome = AttemptOutcome {
            attempt_number,
            is_best: result.best_result.as_ref().map(|b| b.attempt_number) == Some(attempt_number),
            slot_completed,
            exercise_status: result.status,
        };
        session.updated_at = now;

        debug!(
            "Recorded attempt {} for {} in session {}",
            attempt_number, exercise_id, session.id
        );
        Ok(outcome)
    }

    /// Mark an exercise done regardless of how many sets were performed.
    pub fn complete_exercise(&self, session: &mut WorkoutSession, exercise_id: ExerciseId) -> Result<(), SessionError> {
        ensure_active(session, exercise_id)?;
        let status = self.ensure_result(session, exercise_id)?.status;
        if status == ExerciseStatus::Skipped {
            return Err(SessionError::InvalidExerciseTransition {
                exercise_id,
                from: status,
                to: ExerciseStatus::Completed,
            });
        }

        let now = self.clock.now();
        if !has_slot(session, exercise_id) {
            let planned_order = next_unbound_plan(session, exercise_id);
            push_slot(session, exercise_id, planned_order);
        }
        close_open_slots(session, exercise_id, ExerciseStatus::Completed, now);

        if let Some(result) = session.exercise_results.get_mut(&exercise_id) {
            if result.status != ExerciseStatus::Completed {
                result.status = ExerciseStatus::Completed;
                result.finished_at = Some(now);
            }
        }
        session.updated_at = now;

        info!("Exercise {} marked done in session {}", exercise_id, session.id);
        Ok(())
    }

    /// Skip an exercise. Every open and not-yet-started planned slot for it
    /// is skipped too. Terminal: no further attempts are accepted.
    pub fn skip_exercise(&self, session: &mut WorkoutSession, exercise_id: ExerciseId) -> Result<(), SessionError> {
        ensure_active(session, exercise_id)?;
        let status = self.ensure_result(session, exercise_id)?.status;
        match status {
            ExerciseStatus::Skipped => return Ok(()),
            ExerciseStatus::Completed => {
                return Err(SessionError::InvalidExerciseTransition {
                    exercise_id,
                    from: status,
                    to: ExerciseStatus::Skipped,
                });
            }
            ExerciseStatus::Pending | ExerciseStatus::InProgress => {}
        }

        let now = self.clock.now();
        while let Some(order) = next_unbound_plan(session, exercise_id) {
            push_slot(session, exercise_id, Some(order));
        }
        if !has_slot(session, exercise_id) {
            push_slot(session, exercise_id, None);
        }
        close_open_slots(session, exercise_id, ExerciseStatus::Skipped, now);

        if let Some(result) = session.exercise_results.get_mut(&exercise_id) {
            result.status = ExerciseStatus::Skipped;
            result.finished_at = Some(now);
        }
        session.updated_at = now;

        info!("Exercise {} skipped in session {}", exercise_id, session.id);
        Ok(())
    }

    /// Rebuild the summary from the attempt history.
    ///
    /// Completes an active session when [`is_complete`] holds; otherwise the
    /// status is left alone, so this doubles as a mid-session preview.
    pub fn finalize(&self, session: &mut WorkoutSession) -> FinalizeOutcome {
        let now = self.clock.now();
        let completing = session.status == SessionStatus::Active && is_complete(session);
        if completing {
            session.end_time.get_or_insert(now);
        }

        let summary = build_summary(session, now);
        session.summary = summary.clone();
        session.updated_at = now;

        if completing {
            session.status = SessionStatus::Completed;
            info!(
                "Session {} completed: {} exercises, volume {:.1}, form {:.1}",
                session.id, summary.total_exercises, summary.total_volume, summary.form_score
            );
        } else {
            debug!("Session {} summary refreshed", session.id);
        }

        FinalizeOutcome {
            summary,
            completed: completing,
        }
    }

    /// Make sure a result exists for a known exercise and return it.
    fn ensure_result<'a>(
        &self,
        session: &'a mut WorkoutSession,
        exercise_id: ExerciseId,
    ) -> Result<&'a ExerciseResult, SessionError> {
        if !session.exercise_results.contains_key(&exercise_id) {
            let planned = session
                .planned_exercises
                .iter()
                .find(|p| p.exercise_id == exercise_id)
                .ok_or(SessionError::UnknownExercise(exercise_id))?;
            let result = ExerciseResult::new(exercise_id, planned.name.clone(), planned.measurement);
            session.exercise_results.insert(exercise_id, result);
        }
        session
            .exercise_results
            .get(&exercise_id)
            .ok_or(SessionError::UnknownExercise(exercise_id))
    }
}

impl std::fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine").field("config", &self.config).finish()
    }
}

fn ensure_active(session: &WorkoutSession, exercise_id: ExerciseId) -> Result<(), SessionError> {
    if session.status != SessionStatus::Active {
        return Err(SessionError::InvalidAttempt {
            exercise_id,
            reason: AttemptRejection::SessionNotActive(session.status),
        });
    }
    Ok(())
}

fn is_planned(session: &WorkoutSession, exercise_id: ExerciseId) -> bool {
    session.planned_exercises.iter().any(|p| p.exercise_id == exercise_id)
}

fn has_slot(session: &WorkoutSession, exercise_id: ExerciseId) -> bool {
    session.actual_exercises.iter().any(|a| a.exercise_id == exercise_id)
}

fn open_slot(session: &WorkoutSession, exercise_id: ExerciseId) -> Option<usize> {
    session
        .actual_exercises
        .iter()
        .position(|a| a.exercise_id == exercise_id && a.is_open())
}

fn last_slot(session: &WorkoutSession, exercise_id: ExerciseId) -> Option<usize> {
    session
        .actual_exercises
        .iter()
        .rposition(|a| a.exercise_id == exercise_id)
}

/// Order of the first planned slot for `exercise_id` that no execution has
/// claimed yet.
fn next_unbound_plan(session: &WorkoutSession, exercise_id: ExerciseId) -> Option<u32> {
    let bound: BTreeSet<u32> = session
        .actual_exercises
        .iter()
        .filter_map(|a| a.planned_order)
        .collect();
    session
        .planned_exercises
        .iter()
        .filter(|p| p.exercise_id == exercise_id && !bound.contains(&p.order))
        .map(|p| p.order)
        .min()
}

/// Every planned slot for the exercise has a finished execution.
fn planned_slots_finished(session: &WorkoutSession, exercise_id: ExerciseId) -> bool {
    session
        .planned_exercises
        .iter()
        .filter(|p| p.exercise_id == exercise_id)
        .all(|p| {
            session
                .actual_exercises
                .iter()
                .any(|a| a.planned_order == Some(p.order) && a.status.is_finished())
        })
}

fn push_slot(session: &mut WorkoutSession, exercise_id: ExerciseId, planned_order: Option<u32>) -> usize {
    session.actual_exercises.push(ActualExercise {
        exercise_id,
        order: session.actual_exercises.len() as u32 + 1,
        planned_order,
        start_time: None,
        end_time: None,
        status: ExerciseStatus::Pending,
        completed_sets: 0,
    });
    session.actual_exercises.len() - 1
}

fn close_open_slots(session: &mut WorkoutSession, exercise_id: ExerciseId, status: ExerciseStatus, now: Time) {
    for slot in session
        .actual_exercises
        .iter_mut()
        .filter(|a| a.exercise_id == exercise_id && a.is_open())
    {
        slot.status = status;
        slot.end_time = Some(now);
    }
}

fn build_summary(session: &WorkoutSession, now: Time) -> WorkoutSummary {
    let unique: BTreeSet<ExerciseId> = session.actual_exercises.iter().map(|a| a.exercise_id).collect();

    WorkoutSummary {
        total_exercises: session.actual_exercises.len(),
        unique_exercises: unique.len(),
        total_sets: all_attempts(session).count(),
        total_volume: calculate_volume_load(session),
        total_duration: calculate_duration(session),
        total_calories: calculate_calories(session),
        form_score: calculate_average_form_score(session),
        exercise_summaries: session
            .exercise_results
            .values()
            .map(|r| ExerciseSummary {
                exercise_id: r.exercise_id,
                name: r.name.clone(),
                total_attempts: r.attempts.len(),
                best_result: r.best_result.clone(),
            })
            .collect(),
        finalized_at: Some(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use forma_core::{FixedClock, PlannedExercise, UserId};

    struct Fixture {
        clock: Arc<FixedClock>,
        engine: SessionEngine,
        squat: ExerciseId,
        press: ExerciseId,
        session: WorkoutSession,
    }

    fn fixture() -> Fixture {
        let start = Utc.with_ymd_and_hms(2024, 4, 2, 17, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(start));
        let squat = ExerciseId::new();
        let press = ExerciseId::new();
        let session = WorkoutSession::new(
            UserId::new(),
            "Full body",
            vec![
                PlannedExercise::new(squat, "Back squat", 1, 2, 5),
                PlannedExercise::new(press, "Overhead press", 2, 2, 8),
            ],
            start,
        );
        Fixture {
            engine: SessionEngine::new(clock.clone()),
            clock,
            squat,
            press,
            session,
        }
    }

    #[test]
    fn test_volume_load_treats_missing_weight_as_zero() {
        let mut f = fixture();
        f.engine
            .record_attempt(&mut f.session, f.squat, AttemptInput::reps(5, 8.0).with_weight(100.0))
            .unwrap();
        f.engine.record_attempt(&mut f.session, f.press, AttemptInput::reps(8, 7.0)).unwrap();
        assert_eq!(calculate_volume_load(&f.session), 500.0);
    }

    #[test]
    fn test_average_form_score() {
        let mut f = fixture();
        assert_eq!(calculate_average_form_score(&f.session), 0.0);

        for score in [8.0, 6.0, 10.0] {
            f.engine
                .record_attempt(&mut f.session, f.squat, AttemptInput::reps(5, score).with_weight(60.0))
                .unwrap();
        }
        assert_eq!(calculate_average_form_score(&f.session), 8.0);
    }

    #[test]
    fn test_empty_session_is_never_complete() {
        let f = fixture();
        assert!(!is_complete(&f.session));
    }

    #[test]
    fn test_completed_and_skipped_count_as_complete() {
        let mut f = fixture();
        f.engine.complete_exercise(&mut f.session, f.squat).unwrap();
        f.engine.complete_exercise(&mut f.session, f.press).unwrap();
        assert!(is_complete(&f.session));

        let mut f = fixture();
        f.engine.skip_exercise(&mut f.session, f.squat).unwrap();
        f.engine.complete_exercise(&mut f.session, f.press).unwrap();
        assert!(is_complete(&f.session));
    }

    #[test]
    fn test_reaching_planned_sets_completes_exercise() {
        let mut f = fixture();
        let first = f
            .engine
            .record_attempt(&mut f.session, f.squat, AttemptInput::reps(5, 7.5).with_weight(100.0))
            .unwrap();
        assert_eq!(first.exercise_status, ExerciseStatus::InProgress);
        assert!(!first.slot_completed);

        let second = f
            .engine
            .record_attempt(&mut f.session, f.squat, AttemptInput::reps(5, 8.0).with_weight(100.0))
            .unwrap();
        assert!(second.slot_completed);
        assert!(second.is_best);
        assert_eq!(second.exercise_status, ExerciseStatus::Completed);
        assert_eq!(f.session.actual_exercises.len(), 1);
        assert_eq!(f.session.actual_exercises[0].completed_sets, 2);
    }

    #[test]
    fn test_extra_sets_do_not_reopen_exercise() {
        let mut f = fixture();
        for _ in 0..3 {
            f.engine
                .record_attempt(&mut f.session, f.squat, AttemptInput::reps(5, 8.0).with_weight(90.0))
                .unwrap();
        }
        assert_eq!(f.session.actual_exercises.len(), 1);
        assert_eq!(f.session.actual_exercises[0].completed_sets, 3);
        assert_eq!(f.session.actual_exercises[0].status, ExerciseStatus::Completed);
        assert_eq!(f.session.exercise_results[&f.squat].attempts.len(), 3);
    }

    #[test]
    fn test_skipped_exercise_rejects_attempts() {
        let mut f = fixture();
        f.engine.skip_exercise(&mut f.session, f.press).unwrap();
        let err = f
            .engine
            .record_attempt(&mut f.session, f.press, AttemptInput::reps(8, 7.0))
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidAttempt {
                exercise_id: f.press,
                reason: AttemptRejection::ExerciseSkipped
            }
        );
    }

    #[test]
    fn test_out_of_range_attempts_are_rejected() {
        let mut f = fixture();
        let bad = [
            AttemptInput::reps(5, 10.5),
            AttemptInput::reps(5, -0.1),
            AttemptInput::reps(5, 8.0).with_duration(-1.0),
            AttemptInput::reps(5, 8.0).with_weight(-20.0),
            AttemptInput::reps(5, f64::NAN),
        ];
        for input in bad {
            let err = f.engine.record_attempt(&mut f.session, f.squat, input).unwrap_err();
            assert!(matches!(err, SessionError::InvalidAttempt { .. }));
        }
        assert!(f.session.actual_exercises.is_empty());
        assert!(f.session.exercise_results.is_empty());
    }

    #[test]
    fn test_unknown_exercise_is_rejected() {
        let mut f = fixture();
        let stranger = ExerciseId::new();
        let err = f
            .engine
            .record_attempt(&mut f.session, stranger, AttemptInput::reps(5, 8.0))
            .unwrap_err();
        assert_eq!(err, SessionError::UnknownExercise(stranger));
    }

    #[test]
    fn test_unplanned_exercise_needs_registration() {
        let mut f = fixture();
        let curl = ExerciseId::new();
        f.engine
            .add_exercise(&mut f.session, curl, "Biceps curl", MeasurementType::Weighted)
            .unwrap();
        f.engine
            .record_attempt(&mut f.session, curl, AttemptInput::reps(12, 7.0).with_weight(15.0))
            .unwrap();
        assert_eq!(f.session.exercise_results[&curl].status, ExerciseStatus::InProgress);
        assert_eq!(f.session.actual_exercises[0].planned_order, None);

        let strict = SessionEngine::new(f.clock.clone()).with_config(SessionConfig {
            allow_unplanned_exercises: false,
        });
        let err = strict
            .add_exercise(&mut f.session, ExerciseId::new(), "Shrug", MeasurementType::Weighted)
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidAttempt {
                reason: AttemptRejection::Unplanned,
                ..
            }
        ));
    }

    #[test]
    fn test_repeated_exercise_counts_toward_total_not_unique() {
        let start = Utc.with_ymd_and_hms(2024, 4, 2, 17, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(start));
        let engine = SessionEngine::new(clock.clone());
        let row = ExerciseId::new();
        let mut session = WorkoutSession::new(
            UserId::new(),
            "Row ladder",
            vec![
                PlannedExercise::new(row, "Row", 1, 1, 10),
                PlannedExercise::new(row, "Row", 2, 1, 10),
            ],
            start,
        );

        let first = engine.record_attempt(&mut session, row, AttemptInput::reps(10, 8.0).with_weight(50.0)).unwrap();
        assert!(first.slot_completed);
        assert_eq!(first.exercise_status, ExerciseStatus::InProgress);

        let second = engine.record_attempt(&mut session, row, AttemptInput::reps(10, 8.0).with_weight(55.0)).unwrap();
        assert_eq!(second.exercise_status, ExerciseStatus::Completed);
        assert_eq!(session.actual_exercises[1].planned_order, Some(2));

        clock.advance(Duration::minutes(20));
        let outcome = engine.finalize(&mut session);
        assert!(outcome.completed);
        assert_eq!(outcome.summary.total_exercises, 2);
        assert_eq!(outcome.summary.unique_exercises, 1);
        assert!(outcome.summary.total_exercises >= outcome.summary.unique_exercises);
    }

    #[test]
    fn test_sets_after_marking_done_do_not_bind_remaining_plan() {
        let start = Utc.with_ymd_and_hms(2024, 4, 2, 17, 0, 0).unwrap();
        let engine = SessionEngine::new(Arc::new(FixedClock::new(start)));
        let row = ExerciseId::new();
        let mut session = WorkoutSession::new(
            UserId::new(),
            "Row ladder",
            vec![
                PlannedExercise::new(row, "Row", 1, 3, 10),
                PlannedExercise::new(row, "Row", 2, 3, 10),
            ],
            start,
        );

        engine.record_attempt(&mut session, row, AttemptInput::reps(10, 8.0).with_weight(50.0)).unwrap();
        engine.complete_exercise(&mut session, row).unwrap();
        assert!(is_complete(&session));

        let extra = engine.record_attempt(&mut session, row, AttemptInput::reps(10, 7.0).with_weight(50.0)).unwrap();
        assert_eq!(extra.exercise_status, ExerciseStatus::Completed);
        assert!(!extra.slot_completed);

        engine.start_exercise(&mut session, row).unwrap();

        assert!(is_complete(&session));
        assert_eq!(session.actual_exercises.len(), 1);
        assert_eq!(session.actual_exercises[0].completed_sets, 2);
        assert!(session
            .actual_exercises
            .iter()
            .all(|a| a.status != ExerciseStatus::InProgress));
        assert_eq!(session.exercise_results[&row].attempts.len(), 2);
        assert!(engine.finalize(&mut session).completed);
    }

    #[test]
    fn test_finalize_builds_summary_and_completes() {
        let mut f = fixture();
        f.engine
            .record_attempt(
                &mut f.session,
                f.squat,
                AttemptInput::reps(5, 8.0).with_weight(100.0).with_calories(12.0),
            )
            .unwrap();

        let preview = f.engine.finalize(&mut f.session);
        assert!(!preview.completed);
        assert_eq!(f.session.status, SessionStatus::Active);
        assert_eq!(preview.summary.total_duration, 0);
        assert_eq!(preview.summary.total_sets, 1);

        f.engine
            .record_attempt(&mut f.session, f.squat, AttemptInput::reps(5, 8.0).with_weight(110.0))
            .unwrap();

        f.engine.skip_exercise(&mut f.session, f.press).unwrap();
        f.clock.advance(Duration::seconds(47 * 60 + 31));
        let outcome = f.engine.finalize(&mut f.session);

        assert!(outcome.completed);
        assert_eq!(f.session.status, SessionStatus::Completed);
        assert_eq!(f.session.end_time, Some(f.clock.now()));
        let summary = &outcome.summary;
        assert_eq!(summary.total_duration, 48);
        assert_eq!(summary.total_volume, 1050.0);
        assert_eq!(summary.total_sets, 2);
        assert_eq!(summary.total_calories, 12.0);
        assert_eq!(summary.form_score, 8.0);
        assert_eq!(summary.unique_exercises, 2);

        let squat = summary
            .exercise_summaries
            .iter()
            .find(|s| s.exercise_id == f.squat)
            .unwrap();
        assert_eq!(squat.total_attempts, 2);
        assert_eq!(squat.best_result.as_ref().unwrap().weight, Some(110.0));
        assert_eq!(&f.session.summary, summary);
    }

    #[test]
    fn test_finalize_on_completed_session_is_not_a_new_completion() {
        let mut f = fixture();
        f.engine.complete_exercise(&mut f.session, f.squat).unwrap();
        f.engine.complete_exercise(&mut f.session, f.press).unwrap();
        assert!(f.engine.finalize(&mut f.session).completed);
        assert!(!f.engine.finalize(&mut f.session).completed);
    }

    #[test]
    fn test_duration_falls_back_to_previous_summary() {
        let mut f = fixture();
        f.session.start_time = None;
        assert_eq!(calculate_duration(&f.session), 0);
        f.session.summary.total_duration = 35;
        assert_eq!(calculate_duration(&f.session), 35);
    }

    #[test]
    fn test_session_transitions() {
        let mut f = fixture();
        let err = f.engine.start(&mut f.session).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                from: SessionStatus::Active,
                to: SessionStatus::Active
            }
        );

        f.engine.abandon(&mut f.session).unwrap();
        assert_eq!(f.session.status, SessionStatus::Abandoned);
        assert!(f.session.end_time.is_some());
        assert!(f.engine.start(&mut f.session).is_err());
        assert!(f
            .engine
            .record_attempt(&mut f.session, f.squat, AttemptInput::reps(5, 8.0))
            .is_err());
    }

    #[test]
    fn test_pending_session_must_be_started() {
        let mut f = fixture();
        let now = f.clock.now();
        let mut session = WorkoutSession::scheduled(
            UserId::new(),
            "Tomorrow",
            f.session.planned_exercises.clone(),
            now + Duration::days(1),
            now,
        );
        let err = f
            .engine
            .record_attempt(&mut session, f.squat, AttemptInput::reps(5, 8.0))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidAttempt {
                reason: AttemptRejection::SessionNotActive(SessionStatus::Pending),
                ..
            }
        ));

        f.engine.start(&mut session).unwrap();
        assert_eq!(session.start_time, Some(now));
        assert!(f.engine.record_attempt(&mut session, f.squat, AttemptInput::reps(5, 8.0)).is_ok());
    }

    #[test]
    fn test_pending_session_never_finalizes_to_completed() {
        let f = fixture();
        let now = f.clock.now();
        let mut session = WorkoutSession::scheduled(UserId::new(), "Later", Vec::new(), now, now);
        let outcome = f.engine.finalize(&mut session);
        assert!(!outcome.completed);
        assert_eq!(session.status, SessionStatus::Pending);
    }

    #[test]
    fn test_skip_after_completion_is_rejected() {
        let mut f = fixture();
        f.engine.complete_exercise(&mut f.session, f.squat).unwrap();
        let err = f.engine.skip_exercise(&mut f.session, f.squat).unwrap_err();
        assert!(matches!(err, SessionError::InvalidExerciseTransition { .. }));
    }

    #[test]
    fn test_every_executed_exercise_has_a_result() {
        let mut f = fixture();
        f.engine.start_exercise(&mut f.session, f.press).unwrap();
        f.engine
            .record_attempt(&mut f.session, f.squat, AttemptInput::reps(5, 8.0).with_weight(80.0))
            .unwrap();
        f.engine.skip_exercise(&mut f.session, f.press).unwrap();

        for actual in &f.session.actual_exercises {
            assert!(f.session.exercise_results.contains_key(&actual.exercise_id));
        }
        assert_eq!(f.session.exercise_results[&f.press].status, ExerciseStatus::Skipped);
    }
}
