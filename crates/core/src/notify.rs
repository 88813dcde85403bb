//! Notification collaborator.
//!
//! Engines only report that something was just completed; delivering that
//! to the user is the job of whatever [`Notifier`] the caller plugs in.

use serde::{Deserialize, Serialize};
use crate::id::{AchievementId, GoalId, MetricId, SessionId, UserId};

/// Something worth telling the user about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Milestone {
    /// A fitness goal reached its target
    GoalCompleted { goal_id: GoalId, title: String },
    /// An achievement was earned
    AchievementEarned { achievement_id: AchievementId, name: String, points: u32 },
    /// A body measurement reached its target
    BodyTargetReached { metric_id: MetricId, value: f64 },
    /// A tracked metric met its target
    MetricTargetMet { metric_id: MetricId, name: String },
    /// A workout session was completed
    SessionCompleted { session_id: SessionId, name: String },
}

impl std::fmt::Display for Milestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Milestone::GoalCompleted { title, .. } => write!(f, "Goal completed: {}", title),
            Milestone::AchievementEarned { name, points, .. } => {
                write!(f, "Achievement earned: {} (+{} pts)", name, points)
            }
            Milestone::BodyTargetReached { value, .. } => write!(f, "Body target reached at {}", value),
            Milestone::MetricTargetMet { name, .. } => write!(f, "Target met: {}", name),
            Milestone::SessionCompleted { name, .. } => write!(f, "Workout completed: {}", name),
        }
    }
}

/// Delivers milestones to users.
pub trait Notifier: Send + Sync {
    /// Deliver `milestone` to `user_id`.
    fn notify(&self, user_id: UserId, milestone: &Milestone);
}

/// Notifier that only writes a log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, user_id: UserId, milestone: &Milestone) {
        tracing::info!(user = %user_id, "{}", milestone);
    }
}
