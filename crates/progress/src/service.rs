//! Storage-backed progress updates.
//!
//! Loads a subject, runs the tracker on it, saves it back and notifies the
//! owner when the update completed it. The storage lock is held from load to
//! save, so writers to the same store are serialized.

use std::sync::Arc;

use forma_core::{
    Achievement, AchievementId, BodyMetric, FitnessGoal, GoalId, LogNotifier, MetricId, MetricTracking, Notifier,
    UserId,
};
use forma_storage::{Storage, StorageError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::subject::ProgressSubject;
use crate::tracker::{ProgressTracker, ProgressUpdate};

/// Errors from progress service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Storage failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Nothing stored under the id
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind
        kind: &'static str,
        /// Requested id
        id: String,
    },
}

/// Outcome of a batch refresh.
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    /// Goals whose cached percentage changed and was saved
    pub refreshed: usize,
    /// Goals already up to date
    pub unchanged: usize,
    /// Goals that failed to save, with the reason
    pub failures: Vec<(GoalId, String)>,
}

/// Progress service over a shared store.
pub struct GoalProgressService<S: Storage> {
    storage: Arc<Mutex<S>>,
    tracker: ProgressTracker,
    notifier: Arc<dyn Notifier>,
}

impl<S: Storage> GoalProgressService<S> {
    /// Create a service over `storage`.
    pub fn new(storage: Arc<Mutex<S>>, tracker: ProgressTracker) -> Self {
        Self {
            storage,
            tracker,
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Set the notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// The tracker in use.
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Store a new goal with its percentage seeded by the tracker.
    pub async fn create_goal(&self, goal: &mut FitnessGoal) -> Result<ProgressUpdate, ServiceError> {
        let update = self.tracker.initialize(goal);
        self.storage.lock().await.save_goal(goal).await?;
        info!("Created goal {} ({})", goal.id, goal.title);

        self.announce(update, goal.user_id, &*goal);
        Ok(update)
    }

    /// Store a new achievement.
    pub async fn create_achievement(&self, achievement: &mut Achievement) -> Result<ProgressUpdate, ServiceError> {
        let update = self.tracker.initialize(achievement);
        self.storage.lock().await.save_achievement(achievement).await?;
        info!("Created achievement {} ({})", achievement.id, achievement.name);

        self.announce(update, achievement.user_id, &*achievement);
        Ok(update)
    }

    /// Store a first body measurement.
    pub async fn create_body_metric(&self, metric: &mut BodyMetric) -> Result<ProgressUpdate, ServiceError> {
        let update = self.tracker.initialize(metric);
        self.storage.lock().await.save_body_metric(metric).await?;
        info!("Created body metric {} ({:?})", metric.id, metric.kind);

        self.announce(update, metric.user_id, &*metric);
        Ok(update)
    }

    /// Store a new tracked metric.
    pub async fn create_metric(&self, metric: &mut MetricTracking) -> Result<ProgressUpdate, ServiceError> {
        let update = self.tracker.initialize(metric);
        self.storage.lock().await.save_metric(metric).await?;
        info!("Created metric {} ({})", metric.id, metric.name);

        self.announce(update, metric.user_id, &*metric);
        Ok(update)
    }

    /// Record a new reading for a goal.
    pub async fn update_goal(&self, id: GoalId, value: f64) -> Result<ProgressUpdate, ServiceError> {
        let mut storage = self.storage.lock().await;
        let mut goal = storage.load_goal(id).await?.ok_or_else(|| not_found("goal", id))?;

        let update = self.tracker.record_value(&mut goal, value);
        storage.save_goal(&goal).await?;
        debug!("Goal {} now at {:.1}%", id, update.progress_percent);

        self.announce(update, goal.user_id, &goal);
        Ok(update)
    }

    /// Add progress to an achievement.
    pub async fn add_achievement_progress(
        &self,
        id: AchievementId,
        delta: f64,
    ) -> Result<ProgressUpdate, ServiceError> {
        let mut storage = self.storage.lock().await;
        let mut achievement = storage
            .load_achievement(id)
            .await?
            .ok_or_else(|| not_found("achievement", id))?;

        let update = self.tracker.increment(&mut achievement, delta);
        storage.save_achievement(&achievement).await?;

        self.announce(update, achievement.user_id, &achievement);
        Ok(update)
    }

    /// Record a new body measurement.
    pub async fn record_body_metric(&self, id: MetricId, value: f64) -> Result<ProgressUpdate, ServiceError> {
        let mut storage = self.storage.lock().await;
        let mut metric = storage
            .load_body_metric(id)
            .await?
            .ok_or_else(|| not_found("body metric", id))?;

        let update = self.tracker.record_value(&mut metric, value);
        storage.save_body_metric(&metric).await?;

        self.announce(update, metric.user_id, &metric);
        Ok(update)
    }

    /// Record a new reading for a tracked metric.
    pub async fn record_metric(&self, id: MetricId, value: f64) -> Result<ProgressUpdate, ServiceError> {
        let mut storage = self.storage.lock().await;
        let mut metric = storage.load_metric(id).await?.ok_or_else(|| not_found("metric", id))?;

        let update = self.tracker.record_value(&mut metric, value);
        storage.save_metric(&metric).await?;

        self.announce(update, metric.user_id, &metric);
        Ok(update)
    }

    /// Recompute the cached percentage of every goal.
    ///
    /// Each goal is saved on its own; a failed save is reported and the
    /// loop moves on.
    pub async fn refresh_goals(&self) -> Result<RefreshReport, ServiceError> {
        let mut storage = self.storage.lock().await;
        let goals = storage.list_goals().await?;
        let mut report = RefreshReport::default();

        for mut goal in goals {
            let percent = self.tracker.calculate_progress(&goal, None);
            if percent == goal.progress {
                report.unchanged += 1;
                continue;
            }
            goal.set_progress_percent(percent);
            match storage.save_goal(&goal).await {
                Ok(()) => report.refreshed += 1,
                Err(e) => {
                    warn!("Failed to refresh goal {}: {}", goal.id, e);
                    report.failures.push((goal.id, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    fn announce<P: ProgressSubject>(&self, update: ProgressUpdate, user_id: UserId, subject: &P) {
        if update.just_completed {
            self.notifier.notify(user_id, &subject.milestone());
        }
    }
}

fn not_found(kind: &'static str, id: impl std::fmt::Display) -> ServiceError {
    ServiceError::NotFound {
        kind,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_core::{AchievementCategory, BodyMetricKind, Direction, FixedClock, GoalType, Milestone};
    use forma_storage::MemoryStorage;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: StdMutex<Vec<Milestone>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, _user_id: UserId, milestone: &Milestone) {
            self.sent.lock().unwrap().push(milestone.clone());
        }
    }

    fn service(storage: MemoryStorage) -> (GoalProgressService<MemoryStorage>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let tracker = ProgressTracker::new(Arc::new(FixedClock::new(chrono::Utc::now())));
        let service = GoalProgressService::new(Arc::new(Mutex::new(storage)), tracker)
            .with_notifier(notifier.clone());
        (service, notifier)
    }

    #[tokio::test]
    async fn test_update_goal_notifies_on_completion() {
        let mut storage = MemoryStorage::new();
        let goal = FitnessGoal::new(UserId::new(), "Lose 5kg", GoalType::WeightLoss, 85.0, Some(80.0), chrono::Utc::now());
        storage.save_goal(&goal).await.unwrap();
        let (service, notifier) = service(storage);

        let update = service.update_goal(goal.id, 82.5).await.unwrap();
        assert!(!update.just_completed);
        assert!(notifier.sent.lock().unwrap().is_empty());

        let update = service.update_goal(goal.id, 79.8).await.unwrap();
        assert!(update.just_completed);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], Milestone::GoalCompleted { goal_id, .. } if goal_id == goal.id));
    }

    #[tokio::test]
    async fn test_achievement_progress_is_persisted() {
        let mut storage = MemoryStorage::new();
        let badge = Achievement::new(UserId::new(), "First 5", AchievementCategory::Workout, 5.0, chrono::Utc::now())
            .with_points(50);
        storage.save_achievement(&badge).await.unwrap();
        let (service, notifier) = service(storage);

        for _ in 0..5 {
            service.add_achievement_progress(badge.id, 1.0).await.unwrap();
        }

        let stored = service.storage.lock().await.load_achievement(badge.id).await.unwrap().unwrap();
        assert!(stored.is_completed);
        assert_eq!(stored.current_progress, 5.0);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_goal_is_not_found() {
        let (service, _) = service(MemoryStorage::new());
        let err = service.update_goal(GoalId::new(), 1.0).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { kind: "goal", .. }));
    }

    #[tokio::test]
    async fn test_refresh_goals_only_saves_stale_percentages() {
        let mut storage = MemoryStorage::new();
        let mut stale = FitnessGoal::new(UserId::new(), "Squat 140", GoalType::Strength, 100.0, Some(140.0), chrono::Utc::now())
            .with_direction(Direction::Increasing);
        stale.current_value = 120.0;
        let fresh = FitnessGoal::new(UserId::new(), "Bench 100", GoalType::Strength, 100.0, Some(140.0), chrono::Utc::now());
        storage.save_goal(&stale).await.unwrap();
        storage.save_goal(&fresh).await.unwrap();
        let (service, _) = service(storage);

        let report = service.refresh_goals().await.unwrap();
        assert_eq!(report.refreshed, 1);
        assert_eq!(report.unchanged, 1);
        assert!(report.failures.is_empty());

        let stored = service.storage.lock().await.load_goal(stale.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, 50.0);
    }

    #[tokio::test]
    async fn test_create_seeds_progress_under_tracker_config() {
        let notifier = Arc::new(RecordingNotifier::default());
        let tracker = ProgressTracker::new(Arc::new(FixedClock::new(chrono::Utc::now()))).with_config(
            crate::ProgressConfig {
                no_target: crate::NoTargetPolicy::Zero,
                ..Default::default()
            },
        );
        let service = GoalProgressService::new(Arc::new(Mutex::new(MemoryStorage::new())), tracker)
            .with_notifier(notifier.clone());

        let mut open = FitnessGoal::new(UserId::new(), "Run more", GoalType::Endurance, 5.0, None, chrono::Utc::now());
        service.create_goal(&mut open).await.unwrap();
        let stored = service.storage.lock().await.load_goal(open.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, 0.0);
        assert_eq!(stored.progress, service.tracker().calculate_progress(&stored, None));

        let mut waist = BodyMetric::new(UserId::new(), BodyMetricKind::Waist, "cm", 84.0, chrono::Utc::now());
        service.create_body_metric(&mut waist).await.unwrap();
        let stored = service.storage.lock().await.load_body_metric(waist.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, 0.0);

        let mut squat = FitnessGoal::new(UserId::new(), "Squat 100", GoalType::Strength, 120.0, Some(100.0), chrono::Utc::now());
        let update = service.create_goal(&mut squat).await.unwrap();
        assert!(update.just_completed);
        let stored = service.storage.lock().await.load_goal(squat.id).await.unwrap().unwrap();
        assert!(stored.is_completed);
        assert_eq!(stored.progress, 100.0);

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], Milestone::GoalCompleted { goal_id, .. } if goal_id == squat.id));
    }

    #[tokio::test]
    async fn test_create_achievement_and_metric() {
        let (service, notifier) = service(MemoryStorage::new());

        let mut badge = Achievement::new(UserId::new(), "First 5", AchievementCategory::Workout, 5.0, chrono::Utc::now());
        let update = service.create_achievement(&mut badge).await.unwrap();
        assert_eq!(update.progress_percent, 0.0);
        assert!(!update.just_completed);

        let mut pullups = MetricTracking::new(
            UserId::new(),
            "Pull-ups",
            forma_core::MetricType::Performance,
            5.0,
            Some(15.0),
            Direction::Increasing,
            chrono::Utc::now(),
        );
        let update = service.create_metric(&mut pullups).await.unwrap();
        assert_eq!(update.progress_percent, 0.0);

        let stored = service.storage.lock().await.load_metric(pullups.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, update.progress_percent);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }
}
