//! JSON file storage implementation.
//!
//! Stores each aggregate as a pretty-printed JSON file and keeps a small
//! per-object meta marker (version + updated_at) next to it.

use std::path::{Path, PathBuf};
use forma_core::{
    Achievement, AchievementId, BodyMetric, FitnessGoal, GoalId, MetricId, MetricTracking,
    SessionId, WorkoutSession,
};
use serde::Serialize;
use super::{Storage, Result};
use tokio::fs;
use tracing::debug;

const KINDS: [&str; 5] = ["goals", "achievements", "body_metrics", "metrics", "sessions"];

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage rooted at `root`, creating the data and meta
    /// subdirectories as needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        for kind in KINDS {
            fs::create_dir_all(root.join(kind)).await?;
            fs::create_dir_all(root.join("meta").join(kind)).await?;
        }

        Ok(Self { root })
    }

    /// Storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join(kind).join(format!("{}.json", id))
    }

    fn meta_path(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join("meta").join(kind).join(format!("{}.meta.json", id))
    }

    /// Current stored version of an object, 0 if never saved.
    pub async fn version(&self, kind: &str, id: &str) -> Result<u64> {
        let version = match fs::read_to_string(self.meta_path(kind, id)).await {
            Ok(s) => serde_json::from_str::<serde_json::Value>(&s)
                .ok()
                .and_then(|json| json.get("version").and_then(|v| v.as_u64()))
                .unwrap_or(0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        Ok(version)
    }

    /// Read and increment per-object version, return new version.
    async fn bump_version(&self, kind: &str, id: &str) -> Result<u64> {
        let version = self.version(kind, id).await? + 1;
        let meta = serde_json::json!({"version": version, "updated_at": chrono::Utc::now()});
        fs::write(self.meta_path(kind, id), serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(version)
    }

    async fn write_object<T: Serialize + Sync>(&self, kind: &str, id: String, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(self.object_path(kind, &id), json.as_bytes()).await?;

        let version = self.bump_version(kind, &id).await?;
        debug!("Saved {}/{} (v{})", kind, id, version);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_goal(&mut self, goal: &FitnessGoal) -> Result<()> {
        self.write_object("goals", goal.id.to_string(), goal).await
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<FitnessGoal>> {
        read_json(&self.object_path("goals", &id.to_string())).await
    }

    async fn list_goals(&self) -> Result<Vec<FitnessGoal>> {
        let mut goals = list_dir(&self.root.join("goals")).await?;
        goals.sort_by(|a: &FitnessGoal, b| a.created_at.cmp(&b.created_at));
        Ok(goals)
    }

    async fn save_achievement(&mut self, achievement: &Achievement) -> Result<()> {
        self.write_object("achievements", achievement.id.to_string(), achievement).await
    }

    async fn load_achievement(&self, id: AchievementId) -> Result<Option<Achievement>> {
        read_json(&self.object_path("achievements", &id.to_string())).await
    }

    async fn list_achievements(&self) -> Result<Vec<Achievement>> {
        list_dir(&self.root.join("achievements")).await
    }

    async fn save_body_metric(&mut self, metric: &BodyMetric) -> Result<()> {
        self.write_object("body_metrics", metric.id.to_string(), metric).await
    }

    async fn load_body_metric(&self, id: MetricId) -> Result<Option<BodyMetric>> {
        read_json(&self.object_path("body_metrics", &id.to_string())).await
    }

    async fn list_body_metrics(&self) -> Result<Vec<BodyMetric>> {
        let mut metrics = list_dir(&self.root.join("body_metrics")).await?;
        metrics.sort_by(|a: &BodyMetric, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(metrics)
    }

    async fn save_metric(&mut self, metric: &MetricTracking) -> Result<()> {
        self.write_object("metrics", metric.id.to_string(), metric).await
    }

    async fn load_metric(&self, id: MetricId) -> Result<Option<MetricTracking>> {
        read_json(&self.object_path("metrics", &id.to_string())).await
    }

    async fn list_metrics(&self) -> Result<Vec<MetricTracking>> {
        let mut metrics = list_dir(&self.root.join("metrics")).await?;
        metrics.sort_by(|a: &MetricTracking, b| a.name.cmp(&b.name));
        Ok(metrics)
    }

    async fn save_session(&mut self, session: &WorkoutSession) -> Result<()> {
        self.write_object("sessions", session.id.to_string(), session).await
    }

    async fn load_session(&self, id: SessionId) -> Result<Option<WorkoutSession>> {
        read_json(&self.object_path("sessions", &id.to_string())).await
    }

    async fn list_sessions(&self) -> Result<Vec<WorkoutSession>> {
        let mut sessions = list_dir(&self.root.join("sessions")).await?;
        sessions.sort_by(|a: &WorkoutSession, b| a.created_at.cmp(&b.created_at));
        Ok(sessions)
    }

    async fn delete_session(&mut self, id: SessionId) -> Result<()> {
        fs::remove_file(self.object_path("sessions", &id.to_string())).await.or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
        })?;
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if let Ok(Some(item)) = read_json(&entry.path()).await {
            items.push(item);
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_core::{BodyMetricKind, Direction, ExerciseId, GoalType, MetricType, PlannedExercise, UserId};

    #[tokio::test]
    async fn test_goal_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        let goal = FitnessGoal::new(UserId::new(), "Run 10k", GoalType::Endurance, 3.0, Some(10.0), chrono::Utc::now());
        storage.save_goal(&goal).await.unwrap();

        let loaded = storage.load_goal(goal.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, goal.title);
        assert_eq!(loaded.target_value, Some(10.0));
        assert_eq!(storage.list_goals().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_metrics_list_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();
        let user = UserId::new();
        let now = chrono::Utc::now();

        for name in ["VO2 max", "5k time"] {
            let metric = MetricTracking::new(user, name, MetricType::Performance, 40.0, None, Direction::Increasing, now);
            storage.save_metric(&metric).await.unwrap();
        }
        let weight = BodyMetric::new(user, BodyMetricKind::Weight, "kg", 82.0, now);
        storage.save_body_metric(&weight).await.unwrap();

        let names: Vec<_> = storage.list_metrics().await.unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, ["5k time", "VO2 max"]);
        assert_eq!(storage.list_body_metrics().await.unwrap()[0].id, weight.id);
    }

    #[tokio::test]
    async fn test_missing_object_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        assert!(storage.load_session(SessionId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_version_bumps_on_every_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonStorage::new(dir.path()).await.unwrap();

        let session = WorkoutSession::new(
            UserId::new(),
            "Push",
            vec![PlannedExercise::new(ExerciseId::new(), "Bench press", 1, 3, 8)],
            chrono::Utc::now(),
        );
        let id = session.id.to_string();
        assert_eq!(storage.version("sessions", &id).await.unwrap(), 0);

        storage.save_session(&session).await.unwrap();
        storage.save_session(&session).await.unwrap();
        assert_eq!(storage.version("sessions", &id).await.unwrap(), 2);

        storage.delete_session(session.id).await.unwrap();
        assert!(storage.load_session(session.id).await.unwrap().is_none());
        // deleting twice is fine
        storage.delete_session(session.id).await.unwrap();
    }
}
