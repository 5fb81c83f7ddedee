//! Achievement catalogue
//!
//! Each achievement is a row in a static table: display metadata plus a pure
//! predicate over the user's history, stats and personal records. Unlocked
//! state is never stored; it is re-derived from those three inputs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashSet;

use crate::models::{HistoricalWorkout, PersonalRecords, ProfileStats};

/// Everything a predicate may look at
#[derive(Debug, Clone, Copy)]
pub struct AchievementContext<'a> {
    /// Newest-first
    pub history: &'a [HistoricalWorkout],
    pub stats: &'a ProfileStats,
    pub records: &'a PersonalRecords,
}

impl<'a> AchievementContext<'a> {
    pub fn new(
        history: &'a [HistoricalWorkout],
        stats: &'a ProfileStats,
        records: &'a PersonalRecords,
    ) -> Self {
        AchievementContext {
            history,
            stats,
            records,
        }
    }
}

/// One achievement definition
#[derive(Clone, Copy, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    #[serde(skip)]
    pub condition: fn(&AchievementContext<'_>) -> bool,
}

impl std::fmt::Debug for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Achievement")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Achievement {
    pub fn is_unlocked(&self, ctx: &AchievementContext<'_>) -> bool {
        (self.condition)(ctx)
    }
}

/// An achievement together with its derived state, for profile display
#[derive(Debug, Clone, Serialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub unlocked: bool,
}

pub const FIRST_WORKOUT: &str = "first_workout";
pub const WORKOUTS_10: &str = "workouts_10";
pub const WORKOUTS_50: &str = "workouts_50";
pub const WORKOUTS_100: &str = "workouts_100";
pub const STREAK_3: &str = "streak_3";
pub const STREAK_7: &str = "streak_7";
pub const STREAK_30: &str = "streak_30";
pub const RECORDS_5: &str = "records_5";
pub const RECORDS_20: &str = "records_20";
pub const VOLUME_10K: &str = "volume_10k";
pub const VOLUME_100K: &str = "volume_100k";
pub const TIME_1000: &str = "time_1000";
pub const BENCH_100: &str = "bench_100";
pub const SQUAT_140: &str = "squat_140";
pub const DEADLIFT_180: &str = "deadlift_180";
pub const EXPLORER: &str = "explorer";

/// The canonical achievement table
pub static ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: FIRST_WORKOUT,
        name: "First Step",
        description: "Complete your first workout.",
        icon: "footprints",
        condition: |ctx| ctx.stats.total_workouts >= 1,
    },
    Achievement {
        id: WORKOUTS_10,
        name: "Getting Consistent",
        description: "Complete 10 workouts.",
        icon: "dumbbell",
        condition: |ctx| ctx.stats.total_workouts >= 10,
    },
    Achievement {
        id: WORKOUTS_50,
        name: "Regular",
        description: "Complete 50 workouts.",
        icon: "medal",
        condition: |ctx| ctx.stats.total_workouts >= 50,
    },
    Achievement {
        id: WORKOUTS_100,
        name: "Centurion",
        description: "Complete 100 workouts.",
        icon: "trophy",
        condition: |ctx| ctx.stats.total_workouts >= 100,
    },
    Achievement {
        id: STREAK_3,
        name: "On Fire",
        description: "Train 3 days in a row.",
        icon: "flame",
        condition: |ctx| ctx.stats.current_streak >= 3,
    },
    Achievement {
        id: STREAK_7,
        name: "Full Week",
        description: "Train 7 days in a row.",
        icon: "calendar-check",
        condition: |ctx| ctx.stats.current_streak >= 7,
    },
    Achievement {
        id: STREAK_30,
        name: "Unstoppable",
        description: "Train 30 days in a row.",
        icon: "zap",
        condition: |ctx| ctx.stats.current_streak >= 30,
    },
    Achievement {
        id: RECORDS_5,
        name: "Record Breaker",
        description: "Hold personal records in 5 exercises.",
        icon: "star",
        condition: |ctx| ctx.records.len() >= 5,
    },
    Achievement {
        id: RECORDS_20,
        name: "Well Rounded",
        description: "Hold personal records in 20 exercises.",
        icon: "stars",
        condition: |ctx| ctx.records.len() >= 20,
    },
    Achievement {
        id: VOLUME_10K,
        name: "Ten Tonnes",
        description: "Lift 10,000 kg of total volume.",
        icon: "weight",
        condition: |ctx| ctx.stats.total_volume >= 10_000,
    },
    Achievement {
        id: VOLUME_100K,
        name: "Heavy Lifter",
        description: "Lift 100,000 kg of total volume.",
        icon: "mountain",
        condition: |ctx| ctx.stats.total_volume >= 100_000,
    },
    Achievement {
        id: TIME_1000,
        name: "Time Invested",
        description: "Spend 1,000 minutes training.",
        icon: "timer",
        condition: |ctx| ctx.stats.time_spent >= 1_000,
    },
    Achievement {
        id: BENCH_100,
        name: "Bench Club",
        description: "Bench press 100 kg.",
        icon: "award",
        condition: |ctx| record_at_least(ctx, "Bench Press", dec!(100)),
    },
    Achievement {
        id: SQUAT_140,
        name: "Deep Squatter",
        description: "Squat 140 kg.",
        icon: "award",
        condition: |ctx| record_at_least(ctx, "Squat", dec!(140)),
    },
    Achievement {
        id: DEADLIFT_180,
        name: "Floor Puller",
        description: "Deadlift 180 kg.",
        icon: "award",
        condition: |ctx| record_at_least(ctx, "Deadlift", dec!(180)),
    },
    Achievement {
        id: EXPLORER,
        name: "Explorer",
        description: "Train 5 different focus areas.",
        icon: "compass",
        condition: |ctx| distinct_focus_count(ctx) >= 5,
    },
];

fn record_at_least(ctx: &AchievementContext<'_>, exercise: &str, weight: Decimal) -> bool {
    ctx.records.best(exercise) >= weight
}

fn distinct_focus_count(ctx: &AchievementContext<'_>) -> usize {
    ctx.history
        .iter()
        .map(|w| w.focus.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Look up an achievement by id
pub fn find(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Achievements unlocked in the given state, in table order
pub fn unlocked(ctx: &AchievementContext<'_>) -> Vec<&'static Achievement> {
    ACHIEVEMENTS.iter().filter(|a| a.is_unlocked(ctx)).collect()
}

/// Achievements locked in `before` and unlocked in `after`
pub fn newly_unlocked(
    before: &AchievementContext<'_>,
    after: &AchievementContext<'_>,
) -> Vec<&'static Achievement> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| !a.is_unlocked(before) && a.is_unlocked(after))
        .collect()
}

/// Every achievement with its unlocked flag
pub fn statuses(ctx: &AchievementContext<'_>) -> Vec<AchievementStatus> {
    ACHIEVEMENTS
        .iter()
        .map(|a| AchievementStatus {
            achievement: *a,
            unlocked: a.is_unlocked(ctx),
        })
        .collect()
}
