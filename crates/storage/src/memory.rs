//! In-memory storage, for tests and ephemeral runs.

use std::collections::HashMap;
use forma_core::{
    Achievement, AchievementId, BodyMetric, FitnessGoal, GoalId, MetricId, MetricTracking,
    SessionId, WorkoutSession,
};
use super::{Storage, Result};

/// HashMap-backed storage. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    goals: HashMap<GoalId, FitnessGoal>,
    achievements: HashMap<AchievementId, Achievement>,
    body_metrics: HashMap<MetricId, BodyMetric>,
    metrics: HashMap<MetricId, MetricTracking>,
    sessions: HashMap<SessionId, WorkoutSession>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn save_goal(&mut self, goal: &FitnessGoal) -> Result<()> {
        self.goals.insert(goal.id, goal.clone());
        Ok(())
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<FitnessGoal>> {
        Ok(self.goals.get(&id).cloned())
    }

    async fn list_goals(&self) -> Result<Vec<FitnessGoal>> {
        let mut goals: Vec<_> = self.goals.values().cloned().collect();
        goals.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(goals)
    }

    async fn save_achievement(&mut self, achievement: &Achievement) -> Result<()> {
        self.achievements.insert(achievement.id, achievement.clone());
        Ok(())
    }

    async fn load_achievement(&self, id: AchievementId) -> Result<Option<Achievement>> {
        Ok(self.achievements.get(&id).cloned())
    }

    async fn list_achievements(&self) -> Result<Vec<Achievement>> {
        Ok(self.achievements.values().cloned().collect())
    }

    async fn save_body_metric(&mut self, metric: &BodyMetric) -> Result<()> {
        self.body_metrics.insert(metric.id, metric.clone());
        Ok(())
    }

    async fn load_body_metric(&self, id: MetricId) -> Result<Option<BodyMetric>> {
        Ok(self.body_metrics.get(&id).cloned())
    }

    async fn list_body_metrics(&self) -> Result<Vec<BodyMetric>> {
        let mut metrics: Vec<_> = self.body_metrics.values().cloned().collect();
        metrics.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(metrics)
    }

    async fn save_metric(&mut self, metric: &MetricTracking) -> Result<()> {
        self.metrics.insert(metric.id, metric.clone());
        Ok(())
    }

    async fn load_metric(&self, id: MetricId) -> Result<Option<MetricTracking>> {
        Ok(self.metrics.get(&id).cloned())
    }

    async fn list_metrics(&self) -> Result<Vec<MetricTracking>> {
        let mut metrics: Vec<_> = self.metrics.values().cloned().collect();
        metrics.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(metrics)
    }

    async fn save_session(&mut self, session: &WorkoutSession) -> Result<()> {
        self.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn load_session(&self, id: SessionId) -> Result<Option<WorkoutSession>> {
        Ok(self.sessions.get(&id).cloned())
    }

    async fn list_sessions(&self) -> Result<Vec<WorkoutSession>> {
        let mut sessions: Vec<_> = self.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(sessions)
    }

    async fn delete_session(&mut self, id: SessionId) -> Result<()> {
        self.sessions.remove(&id);
        Ok(())
    }
}
