//! Fitness goal model - a user objective tracked against a target value.

use serde::{Deserialize, Serialize};
use crate::id::{GoalId, UserId};
use crate::progress::{initial_percent, Direction};
use crate::Time;

/// A goal the user is working towards, updated with absolute readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessGoal {
    /// Unique identifier
    pub id: GoalId,

    /// Owner
    pub user_id: UserId,

    /// Goal title
    pub title: String,

    /// Detailed description
    pub description: String,

    /// What kind of goal this is
    pub goal_type: GoalType,

    /// Unit the values are expressed in ("kg", "km", "min")
    pub unit: Option<String>,

    /// Value when the goal was set; the progress baseline
    pub start_value: Option<f64>,

    /// Latest reading
    pub current_value: f64,

    /// Reading before the latest one
    pub previous_value: Option<f64>,

    /// Target reading, `None` when no target has been set
    pub target_value: Option<f64>,

    /// Which way counts as progress
    pub direction: Direction,

    /// Cached completion percentage (0-100)
    pub progress: f64,

    /// Sticky completion flag
    pub is_completed: bool,

    /// When the goal was first completed
    pub completed_at: Option<Time>,

    /// Deadline
    pub target_date: Option<chrono::NaiveDate>,

    /// When created
    pub created_at: Time,

    /// Last updated
    pub updated_at: Time,
}

impl FitnessGoal {
    /// Create a goal starting at `start_value`.
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        goal_type: GoalType,
        start_value: f64,
        target_value: Option<f64>,
        now: Time,
    ) -> Self {
        let direction = goal_type.default_direction();
        Self {
            id: GoalId::new(),
            user_id,
            title: title.into(),
            description: String::new(),
            direction,
            goal_type,
            unit: None,
            start_value: Some(start_value),
            current_value: start_value,
            previous_value: None,
            target_value,
            progress: initial_percent(start_value, target_value, start_value, direction),
            is_completed: false,
            completed_at: None,
            target_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Override the direction implied by the goal type.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self.progress = initial_percent(
            self.current_value,
            self.target_value,
            self.start_value.unwrap_or(0.0),
            direction,
        );
        self
    }

    /// Set the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Goal category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    /// Reduce body weight
    WeightLoss,
    /// Add lean mass
    MuscleGain,
    /// Lift more
    Strength,
    /// Go longer or further
    Endurance,
    /// Range of motion
    Flexibility,
    /// Workouts per period
    Consistency,
    /// Anything else
    Custom,
}

impl GoalType {
    /// The direction a goal of this type usually moves in.
    pub fn default_direction(&self) -> Direction {
        match self {
            GoalType::WeightLoss => Direction::Decreasing,
            _ => Direction::Increasing,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::WeightLoss => "weight_loss",
            GoalType::MuscleGain => "muscle_gain",
            GoalType::Strength => "strength",
            GoalType::Endurance => "endurance",
            GoalType::Flexibility => "flexibility",
            GoalType::Consistency => "consistency",
            GoalType::Custom => "custom",
        }
    }
}

impl std::str::FromStr for GoalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "weight_loss" => Ok(GoalType::WeightLoss),
            "muscle_gain" => Ok(GoalType::MuscleGain),
            "strength" => Ok(GoalType::Strength),
            "endurance" => Ok(GoalType::Endurance),
            "flexibility" => Ok(GoalType::Flexibility),
            "consistency" => Ok(GoalType::Consistency),
            "custom" => Ok(GoalType::Custom),
            other => Err(format!("unknown goal type: {}", other)),
        }
    }
}
