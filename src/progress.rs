use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{ExerciseDataPoint, ExerciseProgress, HistoricalWorkout};

/// Direction of an exercise's strength curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Increasing,
    Stable,
    Decreasing,
}

impl TrendDirection {
    pub fn from_evolution(evolution: Decimal) -> Self {
        if evolution > Decimal::ZERO {
            TrendDirection::Increasing
        } else if evolution < Decimal::ZERO {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        }
    }
}

impl ExerciseProgress {
    pub fn trend(&self) -> TrendDirection {
        TrendDirection::from_evolution(self.evolution)
    }

    /// Heaviest point of the series
    pub fn peak_weight(&self) -> Decimal {
        self.data
            .iter()
            .map(|point| point.max_weight)
            .fold(Decimal::ZERO, Decimal::max)
    }
}

/// Builds per-exercise strength trends out of workout history
pub struct ProgressAggregator;

impl ProgressAggregator {
    /// Compute progress for every exercise with weighted, checked sets.
    ///
    /// `history` is newest-first as stored; series are built oldest-first.
    /// The result is ordered by evolution, largest first. Exercises with
    /// equal evolution keep the order in which they were first performed.
    pub fn compute_progress(history: &[HistoricalWorkout]) -> Vec<ExerciseProgress> {
        let mut order: Vec<&str> = Vec::new();
        let mut series: HashMap<&str, Vec<ExerciseDataPoint>> = HashMap::new();

        for workout in history.iter().rev() {
            for (name, max_weight) in workout_maxima(workout) {
                let points = series.entry(name).or_insert_with(|| {
                    order.push(name);
                    Vec::new()
                });
                points.push(ExerciseDataPoint {
                    date: workout.completed_at,
                    max_weight,
                });
            }
        }

        let mut progress: Vec<ExerciseProgress> = order
            .into_iter()
            .filter_map(|name| {
                let data = series.remove(name)?;
                Self::build(name, data)
            })
            .collect();

        // sort_by is stable, ties stay in first-encounter order
        progress.sort_by(|a, b| b.evolution.cmp(&a.evolution));
        progress
    }

    /// Progress of a single exercise, None when it has no weighted sets
    pub fn progress_for(history: &[HistoricalWorkout], exercise_name: &str) -> Option<ExerciseProgress> {
        let data: Vec<ExerciseDataPoint> = history
            .iter()
            .rev()
            .filter_map(|workout| {
                workout_maxima(workout)
                    .into_iter()
                    .find(|(name, _)| *name == exercise_name)
                    .map(|(_, max_weight)| ExerciseDataPoint {
                        date: workout.completed_at,
                        max_weight,
                    })
            })
            .collect();

        Self::build(exercise_name, data)
    }

    fn build(name: &str, data: Vec<ExerciseDataPoint>) -> Option<ExerciseProgress> {
        let initial_weight = data.first()?.max_weight;
        let current_weight = data.last()?.max_weight;

        Some(ExerciseProgress {
            name: name.to_string(),
            initial_weight,
            current_weight,
            evolution: current_weight - initial_weight,
            workout_count: data.len(),
            data,
        })
    }
}

/// Heaviest checked set per exercise name within one workout, in order of
/// first appearance. A name listed twice yields one point; names without a
/// weighted checked set are skipped.
fn workout_maxima(workout: &HistoricalWorkout) -> Vec<(&str, Decimal)> {
    let mut maxima: Vec<(&str, Decimal)> = Vec::new();
    for exercise in &workout.exercises {
        let max_weight = exercise.max_checked_weight();
        if max_weight <= Decimal::ZERO {
            continue;
        }
        match maxima.iter_mut().find(|(name, _)| *name == exercise.name) {
            Some((_, best)) => *best = (*best).max(max_weight),
            None => maxima.push((exercise.name.as_str(), max_weight)),
        }
    }
    maxima
}
