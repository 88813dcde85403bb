//! Unique identifiers for Forma entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            #[doc = concat!("Generate a new ", stringify!($name))]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

ulid_id!(
    /// Unique identifier for a user
    UserId
);

ulid_id!(
    /// Unique identifier for a FitnessGoal
    GoalId
);

ulid_id!(
    /// Unique identifier for an Achievement
    AchievementId
);

ulid_id!(
    /// Unique identifier for a BodyMetric or MetricTracking record
    MetricId
);

ulid_id!(
    /// Unique identifier for a WorkoutSession
    SessionId
);

ulid_id!(
    /// Unique identifier for an exercise in the catalog
    ExerciseId
);

ulid_id!(
    /// Unique identifier for a workout plan
    PlanId
);
