//! Progress tracking engine.
//!
//! Turns (current, target, direction, baseline) into a bounded completion
//! percentage and decides when a subject flips from incomplete to complete.
//! Completion is sticky: once set it is never cleared.

use std::sync::Arc;

use forma_core::{percent_complete, Clock, Direction, SystemClock, Trend};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::subject::ProgressSubject;

/// What a subject without a target reports as its progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoTargetPolicy {
    /// 100%: nothing left to do
    #[default]
    Complete,
    /// 0%: nothing done towards an unknown end
    Zero,
}

/// Configuration for the progress tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Progress reported when no target is set
    pub no_target: NoTargetPolicy,
    /// Never let a value drop below zero
    pub clamp_at_zero: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            no_target: NoTargetPolicy::Complete,
            clamp_at_zero: true,
        }
    }
}

/// Result of a progress update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    /// The update flipped the subject from incomplete to complete
    pub just_completed: bool,
    /// Percentage after the update
    pub progress_percent: f64,
    /// Movement of an absolute update
    pub trend: Option<Trend>,
}

impl ProgressUpdate {
    fn unchanged(percent: f64) -> Self {
        Self {
            just_completed: false,
            progress_percent: percent,
            trend: None,
        }
    }
}

/// Progress tracker shared by every [`ProgressSubject`].
#[derive(Clone)]
pub struct ProgressTracker {
    config: ProgressConfig,
    clock: Arc<dyn Clock>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ProgressTracker {
    /// Create a tracker reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            config: ProgressConfig::default(),
            clock,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: ProgressConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    /// Completion percentage of `subject`, measured from `start` if given,
    /// else from its stored baseline, else from 0.
    pub fn calculate_progress<P: ProgressSubject + ?Sized>(&self, subject: &P, start: Option<f64>) -> f64 {
        let Some(target) = subject.target() else {
            return match self.config.no_target {
                NoTargetPolicy::Complete => 100.0,
                NoTargetPolicy::Zero => 0.0,
            };
        };
        let start = start.or_else(|| subject.baseline()).unwrap_or(0.0);
        percent_complete(subject.current(), target, start, subject.direction())
    }

    /// Whether the current value satisfies the target.
    pub fn is_target_met<P: ProgressSubject + ?Sized>(&self, subject: &P) -> bool {
        match subject.target() {
            None => false,
            Some(target) => match subject.direction() {
                Direction::Decreasing => subject.current() <= target,
                Direction::Increasing | Direction::Stable => subject.current() >= target,
            },
        }
    }

    /// Seed the cached percentage of a freshly built subject under this
    /// tracker's configuration.
    ///
    /// A subject that already meets its target is completed here, so it is
    /// never stored as pending.
    pub fn initialize<P: ProgressSubject + ?Sized>(&self, subject: &mut P) -> ProgressUpdate {
        let percent = self.calculate_progress(subject, None);
        subject.set_progress_percent(percent);

        let just_completed = !subject.is_complete() && self.is_target_met(subject);
        if just_completed {
            subject.mark_complete(self.clock.now());
            info!("Progress target already met on creation ({} / {:?})", subject.current(), subject.target());
        }

        ProgressUpdate {
            just_completed,
            progress_percent: percent,
            trend: None,
        }
    }

    /// Add `delta` to the subject's value, never past the target.
    ///
    /// Completed subjects are left untouched.
    pub fn increment<P: ProgressSubject + ?Sized>(&self, subject: &mut P, delta: f64) -> ProgressUpdate {
        if subject.is_complete() {
            debug!("Ignoring increment on completed subject");
            return ProgressUpdate::unchanged(subject.progress_percent());
        }
        if !delta.is_finite() {
            warn!("Ignoring non-finite progress delta: {}", delta);
            return ProgressUpdate::unchanged(subject.progress_percent());
        }

        let now = self.clock.now();
        let target = subject.target();
        let was_incomplete = target.is_some_and(|t| subject.current() < t);

        let mut next = subject.current() + delta;
        if let Some(target) = target {
            next = next.min(target);
        }
        if self.config.clamp_at_zero {
            next = next.max(0.0);
        }
        subject.set_current(next);
        subject.touch(now);

        let percent = self.calculate_progress(subject, None);
        subject.set_progress_percent(percent);

        let is_now_complete = target.is_some_and(|t| next >= t);
        let just_completed = was_incomplete && is_now_complete;
        if just_completed {
            subject.mark_complete(now);
            info!("Progress target reached ({} / {:?})", next, target);
        }

        ProgressUpdate {
            just_completed,
            progress_percent: percent,
            trend: None,
        }
    }

    /// Replace the subject's value with a new reading.
    ///
    /// Keeps the replaced value as the previous reading, refreshes the cached
    /// percentage and trend, and completes the subject once its target is
    /// met. Completed subjects are left untouched.
    pub fn record_value<P: ProgressSubject + ?Sized>(&self, subject: &mut P, value: f64) -> ProgressUpdate {
        if subject.is_complete() {
            debug!("Ignoring reading on completed subject");
            return ProgressUpdate::unchanged(subject.progress_percent());
        }
        if !value.is_finite() {
            warn!("Ignoring non-finite reading: {}", value);
            return ProgressUpdate::unchanged(subject.progress_percent());
        }

        let now = self.clock.now();
        let value = if self.config.clamp_at_zero { value.max(0.0) } else { value };

        let previous = subject.current();
        subject.set_previous(previous);
        subject.set_current(value);
        subject.touch(now);

        let trend = Trend::between(previous, value, subject.direction(), subject.target());
        subject.set_trend(trend);

        let percent = self.calculate_progress(subject, None);
        subject.set_progress_percent(percent);

        let just_completed = self.is_target_met(subject);
        if just_completed {
            subject.mark_complete(now);
            info!("Progress target reached ({} / {:?})", value, subject.target());
        }

        ProgressUpdate {
            just_completed,
            progress_percent: percent,
            trend: Some(trend),
        }
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker").field("config", &self.config).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use forma_core::{
        Achievement, AchievementCategory, BodyMetric, BodyMetricKind, FitnessGoal, FixedClock,
        GoalType, MetricTracking, MetricType, Time, UserId,
    };

    fn t0() -> Time {
        Utc.with_ymd_and_hms(2024, 5, 1, 6, 30, 0).unwrap()
    }

    fn tracker() -> ProgressTracker {
        ProgressTracker::new(Arc::new(FixedClock::new(t0())))
    }

    fn goal(start: f64, target: Option<f64>, direction: Direction) -> FitnessGoal {
        FitnessGoal::new(UserId::new(), "goal", GoalType::Custom, start, target, t0()).with_direction(direction)
    }

    #[test]
    fn test_direction_symmetry() {
        let tracker = tracker();

        let mut up = goal(50.0, Some(100.0), Direction::Increasing);
        up.current_value = 75.0;
        assert_eq!(tracker.calculate_progress(&up, None), 50.0);

        let mut down = goal(100.0, Some(50.0), Direction::Decreasing);
        down.current_value = 75.0;
        assert_eq!(tracker.calculate_progress(&down, None), 50.0);
    }

    #[test]
    fn test_progress_is_bounded() {
        let tracker = tracker();
        for direction in [Direction::Increasing, Direction::Decreasing, Direction::Stable] {
            for current in [-500.0, 0.0, 42.0, 100.0, 10_000.0] {
                let mut g = goal(20.0, Some(80.0), direction);
                g.current_value = current;
                let p = tracker.calculate_progress(&g, None);
                assert!((0.0..=100.0).contains(&p), "{:?} {} -> {}", direction, current, p);
            }
        }
    }

    #[test]
    fn test_start_already_past_target() {
        let tracker = tracker();
        let g = goal(120.0, Some(100.0), Direction::Increasing);
        assert_eq!(tracker.calculate_progress(&g, None), 100.0);

        let g = goal(40.0, Some(50.0), Direction::Decreasing);
        assert_eq!(tracker.calculate_progress(&g, None), 100.0);
    }

    #[test]
    fn test_explicit_start_overrides_baseline() {
        let tracker = tracker();
        let mut g = goal(0.0, Some(100.0), Direction::Increasing);
        g.current_value = 60.0;
        assert_eq!(tracker.calculate_progress(&g, None), 60.0);
        assert_eq!(tracker.calculate_progress(&g, Some(20.0)), 50.0);
    }

    #[test]
    fn test_no_target_policy() {
        let g = goal(10.0, None, Direction::Increasing);
        assert_eq!(tracker().calculate_progress(&g, None), 100.0);
        assert!(!tracker().is_target_met(&g));

        let zero = tracker().with_config(ProgressConfig {
            no_target: NoTargetPolicy::Zero,
            ..Default::default()
        });
        assert_eq!(zero.calculate_progress(&g, None), 0.0);
    }

    #[test]
    fn test_is_target_met_respects_direction() {
        let tracker = tracker();
        let mut down = goal(90.0, Some(80.0), Direction::Decreasing);
        down.current_value = 80.0;
        assert!(tracker.is_target_met(&down));
        down.current_value = 80.5;
        assert!(!tracker.is_target_met(&down));

        let mut up = goal(0.0, Some(10.0), Direction::Increasing);
        up.current_value = 9.9;
        assert!(!tracker.is_target_met(&up));
    }

    #[test]
    fn test_increment_completes_once_and_never_overshoots() {
        let tracker = tracker();
        let mut badge = Achievement::new(UserId::new(), "10 workouts", AchievementCategory::Workout, 10.0, t0());

        let update = tracker.increment(&mut badge, 4.0);
        assert!(!update.just_completed);
        assert_eq!(update.progress_percent, 40.0);
        assert_eq!(badge.last_progress_at, Some(t0()));

        let update = tracker.increment(&mut badge, 9.0);
        assert!(update.just_completed);
        assert_eq!(badge.current_progress, 10.0);
        assert!(badge.is_completed);
        assert_eq!(badge.completed_at, Some(t0()));

        let update = tracker.increment(&mut badge, 1.0);
        assert!(!update.just_completed);
        assert_eq!(badge.current_progress, 10.0);
        assert_eq!(badge.progress, 100.0);
    }

    #[test]
    fn test_negative_increment_clamps_at_zero() {
        let tracker = tracker();
        let mut badge = Achievement::new(UserId::new(), "Streak", AchievementCategory::Consistency, 7.0, t0());
        tracker.increment(&mut badge, 2.0);
        tracker.increment(&mut badge, -5.0);
        assert_eq!(badge.current_progress, 0.0);

        let loose = ProgressTracker::new(Arc::new(FixedClock::new(t0()))).with_config(ProgressConfig {
            clamp_at_zero: false,
            ..Default::default()
        });
        loose.increment(&mut badge, -1.0);
        assert_eq!(badge.current_progress, -1.0);
    }

    #[test]
    fn test_record_value_tracks_previous_and_completes() {
        let clock = Arc::new(FixedClock::new(t0()));
        let tracker = ProgressTracker::new(clock.clone());
        let mut weight = BodyMetric::new(UserId::new(), BodyMetricKind::Weight, "kg", 90.0, t0()).with_target(80.0);

        let update = tracker.record_value(&mut weight, 85.0);
        assert!(!update.just_completed);
        assert_eq!(update.progress_percent, 50.0);
        assert_eq!(update.trend, Some(Trend::Improving));
        assert_eq!(weight.previous_value, Some(90.0));

        clock.advance(chrono::Duration::days(30));
        let update = tracker.record_value(&mut weight, 79.5);
        assert!(update.just_completed);
        assert!(weight.target_reached);
        assert_eq!(weight.reached_at, Some(t0() + chrono::Duration::days(30)));
    }

    #[test]
    fn test_completed_subject_is_idempotent() {
        let tracker = tracker();
        let mut metric = MetricTracking::new(
            UserId::new(),
            "Pull-ups",
            MetricType::Performance,
            5.0,
            Some(15.0),
            Direction::Increasing,
            t0(),
        );
        assert!(tracker.record_value(&mut metric, 15.0).just_completed);
        let percent = metric.progress;

        for reading in [3.0, 20.0, 0.0] {
            let update = tracker.record_value(&mut metric, reading);
            assert!(!update.just_completed);
            assert!(metric.is_target_met);
            assert_eq!(metric.current_value, 15.0);
            assert_eq!(metric.progress, percent);
        }
    }

    #[test]
    fn test_record_value_sets_metric_trend() {
        let tracker = tracker();
        let mut metric = MetricTracking::new(
            UserId::new(),
            "5k time",
            MetricType::Performance,
            30.0,
            Some(25.0),
            Direction::Decreasing,
            t0(),
        );
        tracker.record_value(&mut metric, 31.0);
        assert_eq!(metric.trend, Trend::Declining);
        assert_eq!(metric.progress, 0.0);
    }

    #[test]
    fn test_new_subjects_carry_their_computed_progress() {
        let tracker = tracker();

        let open = goal(10.0, None, Direction::Increasing);
        assert_eq!(open.progress, tracker.calculate_progress(&open, None));

        let squat = FitnessGoal::new(UserId::new(), "Squat", GoalType::Strength, 120.0, Some(100.0), t0());
        assert_eq!(squat.progress, tracker.calculate_progress(&squat, None));
        assert_eq!(squat.progress, 100.0);

        let cut = goal(90.0, Some(80.0), Direction::Decreasing);
        assert_eq!(cut.progress, tracker.calculate_progress(&cut, None));

        let waist = BodyMetric::new(UserId::new(), BodyMetricKind::Waist, "cm", 84.0, t0());
        assert_eq!(waist.progress, tracker.calculate_progress(&waist, None));

        let weight = BodyMetric::new(UserId::new(), BodyMetricKind::Weight, "kg", 90.0, t0()).with_target(80.0);
        assert_eq!(weight.progress, tracker.calculate_progress(&weight, None));

        let badge = Achievement::new(UserId::new(), "First run", AchievementCategory::Workout, 1.0, t0());
        assert_eq!(badge.progress, tracker.calculate_progress(&badge, None));

        let pullups = MetricTracking::new(
            UserId::new(),
            "Pull-ups",
            MetricType::Performance,
            5.0,
            Some(15.0),
            Direction::Increasing,
            t0(),
        );
        assert_eq!(pullups.progress, tracker.calculate_progress(&pullups, None));
    }

    #[test]
    fn test_initialize_follows_config_and_completes_met_targets() {
        let zero = tracker().with_config(ProgressConfig {
            no_target: NoTargetPolicy::Zero,
            ..Default::default()
        });
        let mut open = goal(10.0, None, Direction::Increasing);
        let update = zero.initialize(&mut open);
        assert_eq!(update.progress_percent, 0.0);
        assert_eq!(open.progress, 0.0);
        assert!(!update.just_completed);

        let mut squat = FitnessGoal::new(UserId::new(), "Squat", GoalType::Strength, 120.0, Some(100.0), t0());
        let update = tracker().initialize(&mut squat);
        assert!(update.just_completed);
        assert!(squat.is_complete());
        assert_eq!(squat.completed_at(), Some(t0()));

        let again = tracker().initialize(&mut squat);
        assert!(!again.just_completed);
    }

    #[test]
    fn test_zero_target_achievement_is_never_earned() {
        let tracker = tracker();
        let mut badge = Achievement::new(UserId::new(), "Nothing", AchievementCategory::Milestone, 0.0, t0());
        assert_eq!(badge.target_value, None);
        assert!(!tracker.is_target_met(&badge));

        let update = tracker.increment(&mut badge, 1.0);
        assert!(!update.just_completed);
        assert_eq!(update.progress_percent, 100.0);
        assert!(!badge.is_completed);
        assert!(!tracker.is_target_met(&badge));
    }

    #[test]
    fn test_non_finite_reading_is_ignored() {
        let tracker = tracker();
        let mut g = goal(10.0, Some(20.0), Direction::Increasing);
        let update = tracker.record_value(&mut g, f64::NAN);
        assert!(!update.just_completed);
        assert_eq!(g.current_value, 10.0);
        assert!(g.previous_value.is_none());
    }
}
