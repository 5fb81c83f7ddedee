//! Workout recording service
//!
//! Glue between the pure calculators and a `CompletionStore`: load the
//! user's snapshots, compute the new state, commit it in one transaction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, span, warn, Level};

use crate::achievements::{self, AchievementContext, AchievementStatus};
use crate::error::{FocoError, Result, StorageError};
use crate::gamification::{GamificationEngine, GamificationResult};
use crate::models::{
    ExerciseProgress, HistoricalWorkout, PersonalRecords, UserProfile, WorkoutPlan,
    WorkoutSummaryData,
};
use crate::progress::ProgressAggregator;
use crate::stats::StatsCalculator;
use crate::storage::CompletionStore;
use crate::summary::SummaryCalculator;

/// Outcome of recording one workout
#[derive(Debug, Clone, Serialize)]
pub struct WorkoutRecord {
    pub workout: HistoricalWorkout,
    pub summary: WorkoutSummaryData,
    pub gamification: GamificationResult,
}

/// Records workouts and answers progress queries for one store
pub struct WorkoutService<S> {
    store: S,
    engine: GamificationEngine,
    stats: StatsCalculator,
}

impl<S: CompletionStore> WorkoutService<S> {
    pub fn new(store: S) -> Self {
        WorkoutService {
            store,
            engine: GamificationEngine::new(),
            stats: StatsCalculator::new(),
        }
    }

    pub fn with_calculators(store: S, engine: GamificationEngine, stats: StatsCalculator) -> Self {
        WorkoutService { store, engine, stats }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Register a new user at level 1
    pub fn create_profile(&mut self, profile: &UserProfile) -> Result<()> {
        self.store.create_profile(&profile.id, profile)?;
        info!(user_id = %profile.id, "Profile created");
        Ok(())
    }

    pub fn profile(&self, user_id: &str) -> Result<UserProfile> {
        Ok(self
            .store
            .profile(user_id)?
            .ok_or_else(|| StorageError::ProfileNotFound {
                user_id: user_id.to_string(),
            })?)
    }

    /// Finish a plan at `completed_at` and record it
    pub fn complete_plan(
        &mut self,
        user_id: &str,
        plan: WorkoutPlan,
        completed_at: DateTime<Utc>,
    ) -> Result<WorkoutRecord> {
        self.record_workout(user_id, HistoricalWorkout::from_plan(plan, completed_at))
    }

    /// Record a completed workout.
    ///
    /// Summary, stats, XP, records and achievements are all computed against
    /// the snapshot loaded here; nothing is written unless every step
    /// succeeds, and then everything is written together.
    pub fn record_workout(&mut self, user_id: &str, completed: HistoricalWorkout) -> Result<WorkoutRecord> {
        let span = span!(Level::INFO, "record_workout", user_id = %user_id);
        let _guard = span.enter();

        if completed.exercises.iter().any(|e| e.name.trim().is_empty()) {
            return Err(FocoError::Validation(format!(
                "workout '{}' has an exercise without a name",
                completed.title
            )));
        }

        let profile = self.profile(user_id)?;
        let prior_history = self.store.history(user_id)?;
        let current_prs = self.store.personal_records(user_id)?;

        let unparsable = unparsable_weight_count(&completed);
        if unparsable > 0 {
            warn!(
                workout = %completed.title,
                sets = unparsable,
                "Checked sets with unreadable weight counted as zero"
            );
        }

        let summary = SummaryCalculator::summarize(&completed, &prior_history);
        let new_stats = self
            .stats
            .next_stats(&profile.stats, &summary, &prior_history, completed.completed_at);
        debug!(
            total_volume = summary.total_volume,
            new_prs = summary.new_pr_count(),
            streak = new_stats.current_streak,
            "Workout summarized"
        );

        let mut new_history = Vec::with_capacity(prior_history.len() + 1);
        new_history.push(completed.clone());
        new_history.extend(prior_history);

        let gamification = self.engine.process_workout_completion(
            &completed,
            &summary,
            Some(&profile),
            &new_history,
            &current_prs,
            &new_stats,
        )?;

        self.store.commit_completion(
            user_id,
            &completed,
            &gamification.updated_profile.progress_update(),
            &gamification.new_prs,
        )?;

        info!(
            workout = %completed.title,
            earned_xp = gamification.earned_xp,
            level = gamification.updated_profile.level,
            level_up = gamification.level_up,
            achievements = ?gamification.achievement_ids(),
            "Workout recorded"
        );

        Ok(WorkoutRecord {
            workout: completed,
            summary,
            gamification,
        })
    }

    /// Strength trends across the user's whole history
    pub fn exercise_progress(&self, user_id: &str) -> Result<Vec<ExerciseProgress>> {
        let history = self.store.history(user_id)?;
        Ok(ProgressAggregator::compute_progress(&history))
    }

    pub fn personal_records(&self, user_id: &str) -> Result<PersonalRecords> {
        Ok(self.store.personal_records(user_id)?)
    }

    pub fn personal_record_count(&self, user_id: &str) -> Result<usize> {
        Ok(self.personal_records(user_id)?.len())
    }

    /// Every achievement with its current unlocked flag
    pub fn achievement_statuses(&self, user_id: &str) -> Result<Vec<AchievementStatus>> {
        let profile = self.profile(user_id)?;
        let history = self.store.history(user_id)?;
        let records = self.store.personal_records(user_id)?;

        let ctx = AchievementContext::new(&history, &profile.stats, &records);
        Ok(achievements::statuses(&ctx))
    }

    pub fn history(&self, user_id: &str) -> Result<Vec<HistoricalWorkout>> {
        Ok(self.store.history(user_id)?)
    }
}

fn unparsable_weight_count(workout: &HistoricalWorkout) -> usize {
    workout
        .exercises
        .iter()
        .flat_map(|e| e.checked_sets())
        .filter(|set| !set.weight.trim().is_empty() && !set.has_numeric_weight())
        .count()
}
