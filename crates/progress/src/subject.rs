//! The shape every progress-tracked entity exposes to the tracker.
//!
//! Achievements, goals, body metrics and tracked metrics name their fields
//! differently; each implements [`ProgressSubject`] so one tracker serves all
//! four.

use forma_core::{
    Achievement, BodyMetric, Direction, FitnessGoal, Milestone, MetricTracking, Time, Trend,
};

/// A value tracked against a target.
pub trait ProgressSubject {
    /// Latest observed value.
    fn current(&self) -> f64;

    /// Replace the latest observed value.
    fn set_current(&mut self, value: f64);

    /// Target value, `None` when no target is set.
    fn target(&self) -> Option<f64>;

    /// Which way counts as progress.
    fn direction(&self) -> Direction;

    /// Stored baseline the percentage is measured from.
    fn baseline(&self) -> Option<f64> {
        None
    }

    /// Remember the value an absolute update replaced.
    fn set_previous(&mut self, _value: f64) {}

    /// Cached completion percentage.
    fn progress_percent(&self) -> f64;

    /// Cache a completion percentage.
    fn set_progress_percent(&mut self, percent: f64);

    /// Sticky completion flag.
    fn is_complete(&self) -> bool;

    /// Completion timestamp.
    fn completed_at(&self) -> Option<Time>;

    /// Set the completion flag and stamp it. Called at most once.
    fn mark_complete(&mut self, at: Time);

    /// Record that the value was adjusted at `at`.
    fn touch(&mut self, at: Time);

    /// Store the trend of the latest absolute update.
    fn set_trend(&mut self, _trend: Trend) {}

    /// What to announce when this subject completes.
    fn milestone(&self) -> Milestone;
}

impl ProgressSubject for Achievement {
    fn current(&self) -> f64 {
        self.current_progress
    }

    fn set_current(&mut self, value: f64) {
        self.current_progress = value;
    }

    fn target(&self) -> Option<f64> {
        self.target_value
    }

    fn direction(&self) -> Direction {
        Direction::Increasing
    }

    fn progress_percent(&self) -> f64 {
        self.progress
    }

    fn set_progress_percent(&mut self, percent: f64) {
        self.progress = percent;
    }

    fn is_complete(&self) -> bool {
        self.is_completed
    }

    fn completed_at(&self) -> Option<Time> {
        self.completed_at
    }

    fn mark_complete(&mut self, at: Time) {
        self.is_completed = true;
        self.completed_at = Some(at);
    }

    fn touch(&mut self, at: Time) {
        self.last_progress_at = Some(at);
    }

    fn milestone(&self) -> Milestone {
        Milestone::AchievementEarned {
            achievement_id: self.id,
            name: self.name.clone(),
            points: self.points,
        }
    }
}

impl ProgressSubject for FitnessGoal {
    fn current(&self) -> f64 {
        self.current_value
    }

    fn set_current(&mut self, value: f64) {
        self.current_value = value;
    }

    fn target(&self) -> Option<f64> {
        self.target_value
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn baseline(&self) -> Option<f64> {
        self.start_value
    }

    fn set_previous(&mut self, value: f64) {
        self.previous_value = Some(value);
    }

    fn progress_percent(&self) -> f64 {
        self.progress
    }

    fn set_progress_percent(&mut self, percent: f64) {
        self.progress = percent;
    }

    fn is_complete(&self) -> bool {
        self.is_completed
    }

    fn completed_at(&self) -> Option<Time> {
        self.completed_at
    }

    fn mark_complete(&mut self, at: Time) {
        self.is_completed = true;
        self.completed_at = Some(at);
    }

    fn touch(&mut self, at: Time) {
        self.updated_at = at;
    }

    fn milestone(&self) -> Milestone {
        Milestone::GoalCompleted {
            goal_id: self.id,
            title: self.title.clone(),
        }
    }
}

impl ProgressSubject for BodyMetric {
    fn current(&self) -> f64 {
        self.value
    }

    fn set_current(&mut self, value: f64) {
        self.value = value;
    }

    fn target(&self) -> Option<f64> {
        self.target_value
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn baseline(&self) -> Option<f64> {
        self.baseline_value
    }

    fn set_previous(&mut self, value: f64) {
        self.previous_value = Some(value);
    }

    fn progress_percent(&self) -> f64 {
        self.progress
    }

    fn set_progress_percent(&mut self, percent: f64) {
        self.progress = percent;
    }

    fn is_complete(&self) -> bool {
        self.target_reached
    }

    fn completed_at(&self) -> Option<Time> {
        self.reached_at
    }

    fn mark_complete(&mut self, at: Time) {
        self.target_reached = true;
        self.reached_at = Some(at);
    }

    fn touch(&mut self, at: Time) {
        self.recorded_at = at;
    }

    fn milestone(&self) -> Milestone {
        Milestone::BodyTargetReached {
            metric_id: self.id,
            value: self.value,
        }
    }
}

impl ProgressSubject for MetricTracking {
    fn current(&self) -> f64 {
        self.current_value
    }

    fn set_current(&mut self, value: f64) {
        self.current_value = value;
    }

    fn target(&self) -> Option<f64> {
        self.target_value
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn baseline(&self) -> Option<f64> {
        self.baseline_value
    }

    fn set_previous(&mut self, value: f64) {
        self.previous_value = Some(value);
    }

    fn progress_percent(&self) -> f64 {
        self.progress
    }

    fn set_progress_percent(&mut self, percent: f64) {
        self.progress = percent;
    }

    fn is_complete(&self) -> bool {
        self.is_target_met
    }

    fn completed_at(&self) -> Option<Time> {
        self.met_at
    }

    fn mark_complete(&mut self, at: Time) {
        self.is_target_met = true;
        self.met_at = Some(at);
    }

    fn touch(&mut self, at: Time) {
        self.last_recorded_at = at;
    }

    fn set_trend(&mut self, trend: Trend) {
        self.trend = trend;
    }

    fn milestone(&self) -> Milestone {
        Milestone::MetricTargetMet {
            metric_id: self.id,
            name: self.name.clone(),
        }
    }
}
