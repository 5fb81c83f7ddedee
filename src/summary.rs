//! Post-workout summary: per-exercise current vs. last performance
//!
//! The summary is the basis for XP and for the "new PR" badges shown on
//! the summary screen. It never fails: malformed sets count as zero.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::models::{
    CompletedSet, Exercise, ExerciseComparison, ExercisePerformance, HistoricalWorkout,
    WorkoutSummaryData,
};

/// Workout summary calculator
pub struct SummaryCalculator;

impl SummaryCalculator {
    /// Summarize a completed workout against the history that preceded it.
    ///
    /// `prior_history` is newest-first and must not contain `completed`.
    /// An exercise never logged before has `last = None` and still counts as
    /// a new PR when any checked set carries weight.
    pub fn summarize(
        completed: &HistoricalWorkout,
        prior_history: &[HistoricalWorkout],
    ) -> WorkoutSummaryData {
        let mut total_volume = Decimal::ZERO;
        let mut exercises = Vec::with_capacity(completed.exercises.len());

        for exercise in &completed.exercises {
            let current = ExercisePerformance {
                max_weight: exercise.max_checked_weight(),
                total_volume: exercise.checked_volume(),
            };
            total_volume = total_volume.saturating_add(current.total_volume);

            let last = Self::find_last_performance(&exercise.name, prior_history).map(|previous| {
                ExercisePerformance {
                    max_weight: previous.max_checked_weight(),
                    total_volume: previous.checked_volume(),
                }
            });
            let last_max_weight = last.map(|p| p.max_weight).unwrap_or(Decimal::ZERO);

            exercises.push(ExerciseComparison {
                name: exercise.name.clone(),
                current,
                last,
                is_new_pr: current.max_weight > last_max_weight,
            });
        }

        WorkoutSummaryData {
            title: completed.title.clone(),
            total_volume: round_volume(total_volume),
            duration: completed.duration,
            exercises,
        }
    }

    /// Most recent logged performance of an exercise.
    ///
    /// Scans `history` in the order given (newest-first) and returns the first
    /// exercise with that exact name that has at least one logged set.
    pub fn find_last_performance<'a>(
        exercise_name: &str,
        history: &'a [HistoricalWorkout],
    ) -> Option<&'a Exercise> {
        history.iter().find_map(|workout| {
            workout
                .exercises
                .iter()
                .find(|e| e.name == exercise_name && e.has_logged_sets())
        })
    }

    /// Sets of the most recent logged performance, for "last time" hints
    pub fn last_sets<'a>(
        exercise_name: &str,
        history: &'a [HistoricalWorkout],
    ) -> Option<&'a [CompletedSet]> {
        Self::find_last_performance(exercise_name, history).map(Exercise::logged_sets)
    }
}

/// Round half away from zero to a whole volume unit, clamped to `u64`
fn round_volume(volume: Decimal) -> u64 {
    let rounded = volume.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    if rounded <= Decimal::ZERO {
        return 0;
    }
    rounded.to_u64().unwrap_or(u64::MAX)
}
