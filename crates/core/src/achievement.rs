//! Achievement model - a badge earned by accumulating progress.

use serde::{Deserialize, Serialize};
use crate::id::{AchievementId, UserId};
use crate::progress::{initial_percent, Direction};
use crate::Time;

/// An achievement progresses by increments ("10 workouts", "100 km run").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    /// Unique identifier
    pub id: AchievementId,

    /// Owner
    pub user_id: UserId,

    /// Display name
    pub name: String,

    /// Description
    pub description: String,

    /// Category
    pub category: AchievementCategory,

    /// Points awarded on completion
    pub points: u32,

    /// Accumulated progress
    pub current_progress: f64,

    /// Amount needed to earn the achievement
    pub target_value: Option<f64>,

    /// Cached completion percentage (0-100)
    pub progress: f64,

    /// Sticky completion flag
    pub is_completed: bool,

    /// When earned
    pub completed_at: Option<Time>,

    /// Last time progress was added
    pub last_progress_at: Option<Time>,

    /// When created
    pub created_at: Time,
}

impl Achievement {
    /// Create an unearned achievement.
    ///
    /// A target of zero or less means no target: the achievement then has
    /// nothing to count towards and is never earned.
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        category: AchievementCategory,
        target_value: f64,
        now: Time,
    ) -> Self {
        let target_value = (target_value > 0.0).then_some(target_value);
        Self {
            id: AchievementId::new(),
            user_id,
            name: name.into(),
            description: String::new(),
            category,
            points: 0,
            current_progress: 0.0,
            target_value,
            progress: initial_percent(0.0, target_value, 0.0, Direction::Increasing),
            is_completed: false,
            completed_at: None,
            last_progress_at: None,
            created_at: now,
        }
    }

    /// Set the points awarded.
    pub fn with_points(mut self, points: u32) -> Self {
        self.points = points;
        self
    }
}

/// Achievement category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    /// Workout count milestones
    Workout,
    /// Strength milestones
    Strength,
    /// Distance and duration milestones
    Endurance,
    /// Streaks
    Consistency,
    /// One-off milestones
    Milestone,
}

impl std::str::FromStr for AchievementCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "workout" => Ok(AchievementCategory::Workout),
            "strength" => Ok(AchievementCategory::Strength),
            "endurance" => Ok(AchievementCategory::Endurance),
            "consistency" => Ok(AchievementCategory::Consistency),
            "milestone" => Ok(AchievementCategory::Milestone),
            other => Err(format!("unknown achievement category: {}", other)),
        }
    }
}
