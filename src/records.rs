use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{HistoricalWorkout, PersonalRecords};

/// A record beaten by a workout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordChange {
    pub exercise: String,
    /// Stored best before the workout, None when never logged
    pub previous: Option<Decimal>,
    pub new_best: Decimal,
}

/// Maintains the best weight per exercise name
pub struct RecordTracker;

impl RecordTracker {
    /// Produce the record table after a completed workout.
    ///
    /// An entry is replaced only when the workout's heaviest checked set is
    /// strictly heavier than the stored one. Names are matched exactly.
    pub fn update_personal_records(
        current: &PersonalRecords,
        workout: &HistoricalWorkout,
    ) -> PersonalRecords {
        let mut records = current.clone();
        for change in Self::record_changes(current, workout) {
            records.set(change.exercise, change.new_best);
        }
        records
    }

    /// Records the workout would beat, in exercise order
    pub fn record_changes(current: &PersonalRecords, workout: &HistoricalWorkout) -> Vec<RecordChange> {
        let mut changes: Vec<RecordChange> = Vec::new();

        for exercise in &workout.exercises {
            let max_weight = exercise.max_checked_weight();

            // The same exercise listed twice only counts its heavier entry
            if let Some(existing) = changes.iter_mut().find(|c| c.exercise == exercise.name) {
                if max_weight > existing.new_best {
                    existing.new_best = max_weight;
                }
                continue;
            }

            if max_weight > current.best(&exercise.name) {
                changes.push(RecordChange {
                    exercise: exercise.name.clone(),
                    previous: current.contains(&exercise.name).then(|| current.best(&exercise.name)),
                    new_best: max_weight,
                });
            }
        }

        changes
    }

    /// Rebuild a record table from scratch out of a full history
    pub fn from_history(history: &[HistoricalWorkout]) -> PersonalRecords {
        history.iter().rev().fold(PersonalRecords::new(), |records, workout| {
            Self::update_personal_records(&records, workout)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompletedSet, Exercise};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn workout(exercises: Vec<Exercise>) -> HistoricalWorkout {
        HistoricalWorkout {
            title: "Push".to_string(),
            focus: "Chest".to_string(),
            duration: 45,
            exercises,
            completed_at: Utc.with_ymd_and_hms(2024, 9, 23, 18, 0, 0).unwrap(),
        }
    }

    fn lift(name: &str, weights: &[(&str, bool)]) -> Exercise {
        Exercise::new(name, "8").with_sets(
            weights
                .iter()
                .map(|(w, checked)| CompletedSet::new(*checked, *w))
                .collect(),
        )
    }

    #[test]
    fn test_new_exercise_creates_record() {
        let records = PersonalRecords::new();
        let updated =
            RecordTracker::update_personal_records(&records, &workout(vec![lift("Bench Press", &[("60", true)])]));

        assert_eq!(updated.best("Bench Press"), dec!(60));
        assert_eq!(updated.len(), 1);
    }

    #[test]
    fn test_records_never_decrease() {
        let records: PersonalRecords = vec![("Bench Press".to_string(), dec!(80))].into_iter().collect();
        let updated =
            RecordTracker::update_personal_records(&records, &workout(vec![lift("Bench Press", &[("70", true)])]));

        assert_eq!(updated.best("Bench Press"), dec!(80));
        assert_eq!(updated, records);
    }

    #[test]
    fn test_untouched_entries_preserved() {
        let records: PersonalRecords = vec![
            ("Squat".to_string(), dec!(100)),
            ("Bench Press".to_string(), dec!(80)),
        ]
        .into_iter()
        .collect();

        let updated =
            RecordTracker::update_personal_records(&records, &workout(vec![lift("Bench Press", &[("85", true)])]));

        assert_eq!(updated.best("Squat"), dec!(100));
        assert_eq!(updated.best("Bench Press"), dec!(85));
    }

    #[test]
    fn test_unchecked_and_unweighted_ignored() {
        let records = PersonalRecords::new();
        let updated = RecordTracker::update_personal_records(
            &records,
            &workout(vec![
                lift("Bench Press", &[("120", false)]),
                lift("Push-up", &[("", true)]),
            ]),
        );

        assert!(updated.is_empty());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let records: PersonalRecords = vec![("Squat".to_string(), dec!(100))].into_iter().collect();
        let updated = RecordTracker::update_personal_records(&records, &workout(vec![lift("squat", &[("50", true)])]));

        assert_eq!(updated.best("Squat"), dec!(100));
        assert_eq!(updated.best("squat"), dec!(50));
    }

    #[test]
    fn test_record_changes_report_previous() {
        let records: PersonalRecords = vec![("Squat".to_string(), dec!(100))].into_iter().collect();
        let changes = RecordTracker::record_changes(
            &records,
            &workout(vec![lift("Squat", &[("105", true)]), lift("Lunge", &[("20", true)])]),
        );

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].previous, Some(dec!(100)));
        assert_eq!(changes[0].new_best, dec!(105));
        assert_eq!(changes[1].previous, None);
    }

    #[test]
    fn test_duplicate_exercise_uses_heavier_entry() {
        let changes = RecordTracker::record_changes(
            &PersonalRecords::new(),
            &workout(vec![lift("Squat", &[("60", true)]), lift("Squat", &[("70", true)])]),
        );

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_best, dec!(70));
    }

    #[test]
    fn test_from_history() {
        let history = vec![
            workout(vec![lift("Squat", &[("90", true)])]),
            workout(vec![lift("Squat", &[("100", true)])]),
        ];

        assert_eq!(RecordTracker::from_history(&history).best("Squat"), dec!(100));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_update_is_idempotent(
            stored in proptest::collection::vec(0u32..300, 0..4),
            lifted in proptest::collection::vec((0u32..300, any::<bool>()), 1..6)
        ) {
            let names = ["Squat", "Bench Press", "Deadlift", "Row"];
            let records: PersonalRecords = stored
                .iter()
                .enumerate()
                .map(|(i, w)| (names[i].to_string(), Decimal::from(*w)))
                .collect();
            let exercises = lifted
                .iter()
                .enumerate()
                .map(|(i, (w, checked))| {
                    Exercise::new(names[i % names.len()], "5")
                        .with_sets(vec![CompletedSet::new(*checked, w.to_string())])
                })
                .collect();
            let completed = workout(exercises);

            let once = RecordTracker::update_personal_records(&records, &completed);
            let twice = RecordTracker::update_personal_records(&once, &completed);

            prop_assert_eq!(&once, &twice);
            for (name, best) in records.iter() {
                prop_assert!(once.best(name) >= best);
            }
        }
    }
}
