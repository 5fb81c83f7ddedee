//! Gamification engine
//!
//! Turns a completed workout into XP, level changes, personal records and
//! newly unlocked achievements. Everything here is a pure function of the
//! snapshots passed in; persisting the result is the caller's job.

use serde::Serialize;
use tracing::debug;

use crate::achievements::{self, Achievement, AchievementContext};
use crate::error::GamificationError;
use crate::leveling::{GamificationConfig, LevelCalculator};
use crate::models::{
    HistoricalWorkout, PersonalRecords, ProfileStats, UserProfile, WorkoutSummaryData,
};
use crate::records::RecordTracker;

/// Everything a workout completion produced
#[derive(Debug, Clone, Serialize)]
pub struct GamificationResult {
    pub earned_xp: u64,
    pub level_up: bool,
    pub updated_profile: UserProfile,
    pub new_prs: PersonalRecords,
    pub unlocked_achievements: Vec<&'static Achievement>,
}

impl GamificationResult {
    pub fn levels_gained(&self, previous_level: u32) -> u32 {
        self.updated_profile.level.saturating_sub(previous_level)
    }

    pub fn achievement_ids(&self) -> Vec<&'static str> {
        self.unlocked_achievements.iter().map(|a| a.id).collect()
    }
}

/// Applies XP, records and achievements for completed workouts
#[derive(Debug, Clone, Default)]
pub struct GamificationEngine {
    levels: LevelCalculator,
}

impl GamificationEngine {
    pub fn new() -> Self {
        GamificationEngine {
            levels: LevelCalculator::new(),
        }
    }

    pub fn with_config(config: GamificationConfig) -> Result<Self, GamificationError> {
        Ok(GamificationEngine {
            levels: LevelCalculator::with_config(config)?,
        })
    }

    pub fn config(&self) -> &GamificationConfig {
        self.levels.config()
    }

    /// Process a completed workout.
    ///
    /// `new_history` already contains `completed` at its head and
    /// `new_stats` already reflects it. `current_prs` is the table before the
    /// workout. Achievements are diffed between the state without the
    /// workout and the state with it.
    pub fn process_workout_completion(
        &self,
        completed: &HistoricalWorkout,
        summary: &WorkoutSummaryData,
        current_profile: Option<&UserProfile>,
        new_history: &[HistoricalWorkout],
        current_prs: &PersonalRecords,
        new_stats: &ProfileStats,
    ) -> Result<GamificationResult, GamificationError> {
        let profile = current_profile
            .ok_or_else(|| GamificationError::invalid_state("no profile for completed workout"))?;
        if new_history.is_empty() {
            return Err(GamificationError::invalid_state(
                "history must contain the completed workout",
            ));
        }

        let earned_xp = self.levels.earned_xp(summary);
        let outcome = self
            .levels
            .apply_xp(profile.level, profile.xp, profile.xp_to_next_level, earned_xp)?;

        let new_prs = RecordTracker::update_personal_records(current_prs, completed);

        let before = AchievementContext::new(&new_history[1..], &profile.stats, current_prs);
        let after = AchievementContext::new(new_history, new_stats, &new_prs);
        let unlocked_achievements = achievements::newly_unlocked(&before, &after);

        let mut updated_profile = profile.clone();
        updated_profile.level = outcome.level;
        updated_profile.xp = outcome.xp;
        updated_profile.xp_to_next_level = outcome.xp_to_next_level;
        updated_profile.stats = *new_stats;

        debug!(
            user_id = %profile.id,
            earned_xp,
            level = outcome.level,
            levels_gained = outcome.levels_gained,
            achievements = unlocked_achievements.len(),
            "Workout gamification applied"
        );

        Ok(GamificationResult {
            earned_xp,
            level_up: outcome.levels_gained > 0,
            updated_profile,
            new_prs,
            unlocked_achievements,
        })
    }
}
