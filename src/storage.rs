//! Storage collaborators
//!
//! Every call names the user explicitly; there is no ambient session. History
//! comes back newest-first by `completed_at`, later appends first on ties, so
//! a backdated workout lands at its place in time rather than at the head. `CompletionStore::commit_completion` writes the
//! history entry, the profile progression and the record table together or
//! not at all.

use std::collections::HashMap;

use crate::error::StorageError;
use crate::models::{HistoricalWorkout, PersonalRecords, ProgressUpdate, UserProfile};

pub type StorageResult<T> = std::result::Result<T, StorageError>;

pub trait HistoryStore {
    /// Completed workouts, newest `completed_at` first
    fn history(&self, user_id: &str) -> StorageResult<Vec<HistoricalWorkout>>;

    /// Insert a completed workout ahead of every workout completed no later
    fn append(&mut self, user_id: &str, workout: &HistoricalWorkout) -> StorageResult<()>;
}

pub trait ProfileStore {
    fn profile(&self, user_id: &str) -> StorageResult<Option<UserProfile>>;

    /// Store a new profile; its id must be `user_id`
    fn create_profile(&mut self, user_id: &str, profile: &UserProfile) -> StorageResult<()>;

    /// Overwrite level, xp, threshold and stats, leaving every other field alone
    fn update_progress(&mut self, user_id: &str, update: &ProgressUpdate) -> StorageResult<()>;
}

pub trait PersonalRecordsStore {
    /// Record table, empty when the user never logged a weighted set
    fn personal_records(&self, user_id: &str) -> StorageResult<PersonalRecords>;

    /// Replace the whole table
    fn replace_personal_records(&mut self, user_id: &str, records: &PersonalRecords)
        -> StorageResult<()>;
}

/// A store able to persist a workout completion atomically
pub trait CompletionStore: HistoryStore + ProfileStore + PersonalRecordsStore {
    fn commit_completion(
        &mut self,
        user_id: &str,
        workout: &HistoricalWorkout,
        update: &ProgressUpdate,
        records: &PersonalRecords,
    ) -> StorageResult<()>;
}

pub(crate) fn ensure_owner(user_id: &str, profile: &UserProfile) -> StorageResult<()> {
    if profile.id != user_id {
        return Err(StorageError::Unauthorized {
            user_id: profile.id.clone(),
        });
    }
    Ok(())
}

/// Process-local store, used by tests and one-shot CLI runs
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    profiles: HashMap<String, UserProfile>,
    histories: HashMap<String, Vec<HistoricalWorkout>>,
    records: HashMap<String, PersonalRecords>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a single profile
    pub fn with_profile(profile: UserProfile) -> Self {
        let mut store = Self::new();
        store.profiles.insert(profile.id.clone(), profile);
        store
    }
}

impl HistoryStore for InMemoryStore {
    fn history(&self, user_id: &str) -> StorageResult<Vec<HistoricalWorkout>> {
        Ok(self.histories.get(user_id).cloned().unwrap_or_default())
    }

    fn append(&mut self, user_id: &str, workout: &HistoricalWorkout) -> StorageResult<()> {
        let history = self.histories.entry(user_id.to_string()).or_default();
        let position = history
            .iter()
            .position(|w| w.completed_at <= workout.completed_at)
            .unwrap_or(history.len());
        history.insert(position, workout.clone());
        Ok(())
    }
}

impl ProfileStore for InMemoryStore {
    fn profile(&self, user_id: &str) -> StorageResult<Option<UserProfile>> {
        Ok(self.profiles.get(user_id).cloned())
    }

    fn create_profile(&mut self, user_id: &str, profile: &UserProfile) -> StorageResult<()> {
        ensure_owner(user_id, profile)?;
        if self.profiles.contains_key(user_id) {
            return Err(StorageError::Duplicate {
                user_id: user_id.to_string(),
            });
        }
        self.profiles.insert(user_id.to_string(), profile.clone());
        Ok(())
    }

    fn update_progress(&mut self, user_id: &str, update: &ProgressUpdate) -> StorageResult<()> {
        let profile = self
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| StorageError::ProfileNotFound {
                user_id: user_id.to_string(),
            })?;
        profile.level = update.level;
        profile.xp = update.xp;
        profile.xp_to_next_level = update.xp_to_next_level;
        profile.stats = update.stats;
        Ok(())
    }
}

impl PersonalRecordsStore for InMemoryStore {
    fn personal_records(&self, user_id: &str) -> StorageResult<PersonalRecords> {
        Ok(self.records.get(user_id).cloned().unwrap_or_default())
    }

    fn replace_personal_records(
        &mut self,
        user_id: &str,
        records: &PersonalRecords,
    ) -> StorageResult<()> {
        self.records.insert(user_id.to_string(), records.clone());
        Ok(())
    }
}

impl CompletionStore for InMemoryStore {
    fn commit_completion(
        &mut self,
        user_id: &str,
        workout: &HistoricalWorkout,
        update: &ProgressUpdate,
        records: &PersonalRecords,
    ) -> StorageResult<()> {
        // Only failure point, checked before anything is written
        if !self.profiles.contains_key(user_id) {
            return Err(StorageError::ProfileNotFound {
                user_id: user_id.to_string(),
            });
        }

        self.update_progress(user_id, update)?;
        self.append(user_id, workout)?;
        self.replace_personal_records(user_id, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProfileStats, WorkoutPlan};
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn workout(title: &str, days: i64) -> HistoricalWorkout {
        HistoricalWorkout::from_plan(
            WorkoutPlan {
                title: title.to_string(),
                focus: "Legs".to_string(),
                duration: 30,
                exercises: vec![],
            },
            Utc.with_ymd_and_hms(2024, 9, 1, 9, 0, 0).unwrap() + Duration::days(days),
        )
    }

    #[test]
    fn test_history_is_newest_first() {
        let mut store = InMemoryStore::new();
        store.append("u1", &workout("First", 0)).unwrap();
        store.append("u1", &workout("Second", 1)).unwrap();

        let titles: Vec<String> = store.history("u1").unwrap().into_iter().map(|w| w.title).collect();
        assert_eq!(titles, vec!["Second", "First"]);
        assert!(store.history("u2").unwrap().is_empty());
    }

    #[test]
    fn test_backdated_workout_keeps_time_order() {
        let mut store = InMemoryStore::new();
        store.append("u1", &workout("Monday", 0)).unwrap();
        store.append("u1", &workout("Friday", 4)).unwrap();
        store.append("u1", &workout("Wednesday", 2)).unwrap();
        store.append("u1", &workout("Friday again", 4)).unwrap();

        let titles: Vec<String> = store.history("u1").unwrap().into_iter().map(|w| w.title).collect();
        assert_eq!(titles, vec!["Friday again", "Friday", "Wednesday", "Monday"]);
    }

    #[test]
    fn test_update_progress_keeps_identity() {
        let mut profile = UserProfile::new("u1", "Bruno", "bruno@example.com");
        profile.whatsapp = Some("+55 11 99999-0000".to_string());
        let mut store = InMemoryStore::with_profile(profile.clone());

        let update = ProgressUpdate {
            level: 3,
            xp: 20,
            xp_to_next_level: 300,
            stats: ProfileStats {
                total_workouts: 12,
                ..ProfileStats::default()
            },
        };
        store.update_progress("u1", &update).unwrap();

        let stored = store.profile("u1").unwrap().unwrap();
        assert_eq!(stored.progress_update(), update);
        assert_eq!(stored.whatsapp, profile.whatsapp);
        assert_eq!(stored.name, "Bruno");
    }

    #[test]
    fn test_profile_rules() {
        let mut store = InMemoryStore::new();
        let profile = UserProfile::new("u1", "Bruno", "bruno@example.com");

        assert!(matches!(
            store.create_profile("u2", &profile),
            Err(StorageError::Unauthorized { .. })
        ));
        store.create_profile("u1", &profile).unwrap();
        assert!(matches!(
            store.create_profile("u1", &profile),
            Err(StorageError::Duplicate { .. })
        ));
        assert!(matches!(
            store.update_progress("ghost", &profile.progress_update()),
            Err(StorageError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn test_commit_without_profile_writes_nothing() {
        let mut store = InMemoryStore::new();
        let records: PersonalRecords = vec![("Squat".to_string(), dec!(100))].into_iter().collect();
        let update = UserProfile::new("u1", "x", "y").progress_update();

        let result = store.commit_completion("u1", &workout("Legs", 0), &update, &records);

        assert!(matches!(result, Err(StorageError::ProfileNotFound { .. })));
        assert!(store.history("u1").unwrap().is_empty());
        assert!(store.personal_records("u1").unwrap().is_empty());
    }
}
