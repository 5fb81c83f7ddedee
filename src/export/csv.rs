use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;

use super::ExportError;
use crate::models::{Exercise, ExerciseProgress, HistoricalWorkout, PersonalRecords};

#[derive(Serialize)]
struct ProgressRow<'a> {
    exercise: &'a str,
    date: String,
    max_weight: Decimal,
    initial_weight: Decimal,
    current_weight: Decimal,
    evolution: Decimal,
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    completed_at: String,
    title: &'a str,
    focus: &'a str,
    duration_minutes: u32,
    exercises: usize,
    checked_sets: usize,
    volume: Decimal,
}

#[derive(Serialize)]
struct RecordRow<'a> {
    exercise: &'a str,
    best_weight: Decimal,
}

/// Export exercise progress, one row per data point (suitable for charting)
pub fn export_progress<P: AsRef<Path>>(
    progress: &[ExerciseProgress],
    output_path: P,
) -> Result<(), ExportError> {
    let mut writer = ::csv::Writer::from_path(output_path)?;

    for exercise in progress {
        for point in &exercise.data {
            writer.serialize(ProgressRow {
                exercise: &exercise.name,
                date: point.date.format("%Y-%m-%d").to_string(),
                max_weight: point.max_weight,
                initial_weight: exercise.initial_weight,
                current_weight: exercise.current_weight,
                evolution: exercise.evolution,
            })?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Export workout history in stored order (newest first)
pub fn export_history<P: AsRef<Path>>(
    history: &[HistoricalWorkout],
    output_path: P,
) -> Result<(), ExportError> {
    let mut writer = ::csv::Writer::from_path(output_path)?;

    for workout in history {
        writer.serialize(HistoryRow {
            completed_at: workout.completed_at.to_rfc3339(),
            title: &workout.title,
            focus: &workout.focus,
            duration_minutes: workout.duration,
            exercises: workout.exercises.len(),
            checked_sets: workout.exercises.iter().map(|e| e.checked_sets().count()).sum(),
            volume: workout
                .exercises
                .iter()
                .map(Exercise::checked_volume)
                .fold(Decimal::ZERO, Decimal::saturating_add),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Export the personal record table, sorted by exercise name
pub fn export_records<P: AsRef<Path>>(
    records: &PersonalRecords,
    output_path: P,
) -> Result<(), ExportError> {
    let mut writer = ::csv::Writer::from_path(output_path)?;

    for (exercise, best_weight) in records.iter() {
        writer.serialize(RecordRow {
            exercise,
            best_weight,
        })?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompletedSet, Exercise};
    use crate::progress::ProgressAggregator;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tempfile::NamedTempFile;

    fn history() -> Vec<HistoricalWorkout> {
        let workout = |day: u32, weight: &str| HistoricalWorkout {
            title: format!("Legs, day {}", day),
            focus: "Legs".to_string(),
            duration: 45,
            exercises: vec![Exercise::new("Squat", "5").with_sets(vec![
                CompletedSet::new(true, weight),
                CompletedSet::new(false, weight),
            ])],
            completed_at: Utc.with_ymd_and_hms(2024, 9, day, 18, 0, 0).unwrap(),
        };
        vec![workout(3, "60"), workout(1, "50")]
    }

    #[test]
    fn test_export_progress() {
        let progress = ProgressAggregator::compute_progress(&history());
        let temp_file = NamedTempFile::new().unwrap();

        export_progress(&progress, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "exercise,date,max_weight,initial_weight,current_weight,evolution");
        assert_eq!(lines[1], "Squat,2024-09-01,50,50,60,10");
        assert_eq!(lines[2], "Squat,2024-09-03,60,50,60,10");
    }

    #[test]
    fn test_export_history_quotes_titles() {
        let temp_file = NamedTempFile::new().unwrap();
        export_history(&history(), temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("\"Legs, day 3\",Legs,45,1,1,300"));
    }

    #[test]
    fn test_export_records() {
        let records: PersonalRecords = vec![
            ("Squat".to_string(), dec!(100)),
            ("Bench Press".to_string(), dec!(72.5)),
        ]
        .into_iter()
        .collect();
        let temp_file = NamedTempFile::new().unwrap();

        export_records(&records, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content, "exercise,best_weight\nBench Press,72.5\nSquat,100\n");
    }
}
