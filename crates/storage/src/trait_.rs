//! Storage trait abstraction.

use async_trait::async_trait;
use forma_core::{
    Achievement, AchievementId, BodyMetric, FitnessGoal, GoalId, MetricId, MetricTracking,
    SessionId, WorkoutSession,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistence collaborator: load an aggregate by id, save it back whole.
///
/// The engines never touch storage themselves; services load a snapshot,
/// hand it to an engine and save the result.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Goal operations ===

    /// Save a goal (create or update).
    async fn save_goal(&mut self, goal: &FitnessGoal) -> Result<()>;

    /// Load a goal by ID.
    async fn load_goal(&self, id: GoalId) -> Result<Option<FitnessGoal>>;

    /// List all goals.
    async fn list_goals(&self) -> Result<Vec<FitnessGoal>>;

    // === Achievement operations ===

    /// Save an achievement.
    async fn save_achievement(&mut self, achievement: &Achievement) -> Result<()>;

    /// Load an achievement by ID.
    async fn load_achievement(&self, id: AchievementId) -> Result<Option<Achievement>>;

    /// List all achievements.
    async fn list_achievements(&self) -> Result<Vec<Achievement>>;

    // === Metric operations ===

    /// Save a body metric series.
    async fn save_body_metric(&mut self, metric: &BodyMetric) -> Result<()>;

    /// Load a body metric series by ID.
    async fn load_body_metric(&self, id: MetricId) -> Result<Option<BodyMetric>>;

    /// List all body metric series, most recently recorded first.
    async fn list_body_metrics(&self) -> Result<Vec<BodyMetric>>;

    /// Save a tracked metric.
    async fn save_metric(&mut self, metric: &MetricTracking) -> Result<()>;

    /// Load a tracked metric by ID.
    async fn load_metric(&self, id: MetricId) -> Result<Option<MetricTracking>>;

    /// List all tracked metrics by name.
    async fn list_metrics(&self) -> Result<Vec<MetricTracking>>;

    // === Session operations ===

    /// Save a workout session.
    async fn save_session(&mut self, session: &WorkoutSession) -> Result<()>;

    /// Load a workout session by ID.
    async fn load_session(&self, id: SessionId) -> Result<Option<WorkoutSession>>;

    /// List all sessions, oldest first.
    async fn list_sessions(&self) -> Result<Vec<WorkoutSession>>;

    /// Delete a session.
    async fn delete_session(&mut self, id: SessionId) -> Result<()>;
}
