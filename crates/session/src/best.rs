//! Best-result selection.

use std::cmp::Ordering;

use forma_core::{BestResult, ExerciseAttempt, MeasurementType};

/// Order two attempts by quality: form score first, then the measurement's
/// own yardstick (load, repetitions or duration), then recency.
pub fn compare_attempts(a: &ExerciseAttempt, b: &ExerciseAttempt, measurement: MeasurementType) -> Ordering {
    a.form_score
        .total_cmp(&b.form_score)
        .then_with(|| match measurement {
            MeasurementType::Weighted => a.weight.unwrap_or(0.0).total_cmp(&b.weight.unwrap_or(0.0)),
            MeasurementType::Repetitions => a.repetitions.cmp(&b.repetitions),
            MeasurementType::Duration => a.duration_seconds.total_cmp(&b.duration_seconds),
        })
        .then_with(|| a.timestamp.cmp(&b.timestamp))
}

/// The best attempt in `attempts`, if any.
///
/// On a full tie the later attempt in the history wins.
pub fn select_best(attempts: &[ExerciseAttempt], measurement: MeasurementType) -> Option<BestResult> {
    attempts
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| compare_attempts(a, b, measurement))
        .map(|(index, attempt)| BestResult::from_attempt(index, attempt))
}
