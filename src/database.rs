use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use crate::error::StorageError;
use crate::models::{
    HistoricalWorkout, PersonalRecords, ProfileGalleryImage, ProfileStats, ProgressUpdate,
    UserProfile,
};
use crate::storage::{
    ensure_owner, CompletionStore, HistoryStore, PersonalRecordsStore, ProfileStore, StorageResult,
};

/// SQLite-backed store for profiles, workout history and personal records
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create or open a database at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> StorageResult<Self> {
        let conn = Connection::open(db_path)?;
        let mut db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Database living only as long as the connection
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema with tables and indexes
    fn init_schema(&mut self) -> StorageResult<()> {
        // journal_mode answers with a row, so it cannot go through execute_batch
        self.conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;

        self.conn.execute_batch(
            r#"
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;

            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                avatar_url TEXT,
                instagram TEXT,
                whatsapp TEXT,
                gallery TEXT NOT NULL DEFAULT '[]',

                -- Progression
                level INTEGER NOT NULL,
                xp INTEGER NOT NULL,
                xp_to_next_level INTEGER NOT NULL,
                total_workouts INTEGER NOT NULL DEFAULT 0,
                total_volume INTEGER NOT NULL DEFAULT 0,
                time_spent INTEGER NOT NULL DEFAULT 0,
                current_streak INTEGER NOT NULL DEFAULT 0,

                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS workouts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                focus TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL,
                completed_at DATETIME NOT NULL,
                exercises TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,

                FOREIGN KEY (user_id) REFERENCES profiles (id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS personal_records (
                user_id TEXT NOT NULL,
                exercise TEXT NOT NULL,
                weight TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,

                PRIMARY KEY (user_id, exercise),
                FOREIGN KEY (user_id) REFERENCES profiles (id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_workouts_user_completed
                ON workouts (user_id, completed_at);
            "#,
        )?;
        Ok(())
    }

    fn profile_exists(conn: &Connection, user_id: &str) -> StorageResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM profiles WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert_workout(tx: &Transaction, user_id: &str, workout: &HistoricalWorkout) -> StorageResult<()> {
        let exercises = serde_json::to_string(&workout.exercises)?;
        tx.execute(
            r#"
            INSERT INTO workouts (id, user_id, title, focus, duration_minutes, completed_at, exercises)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                Uuid::new_v4().to_string(),
                user_id,
                workout.title,
                workout.focus,
                workout.duration,
                workout.completed_at,
                exercises,
            ],
        )?;
        Ok(())
    }

    fn write_progress(tx: &Transaction, user_id: &str, update: &ProgressUpdate) -> StorageResult<()> {
        let changed = tx.execute(
            r#"
            UPDATE profiles SET
                level = ?2, xp = ?3, xp_to_next_level = ?4,
                total_workouts = ?5, total_volume = ?6, time_spent = ?7, current_streak = ?8,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?1
            "#,
            params![
                user_id,
                update.level,
                to_sql_int(update.xp),
                to_sql_int(update.xp_to_next_level),
                update.stats.total_workouts,
                to_sql_int(update.stats.total_volume),
                to_sql_int(update.stats.time_spent),
                update.stats.current_streak,
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::ProfileNotFound {
                user_id: user_id.to_string(),
            });
        }
        Ok(())
    }

    fn write_records(tx: &Transaction, user_id: &str, records: &PersonalRecords) -> StorageResult<()> {
        tx.execute("DELETE FROM personal_records WHERE user_id = ?1", params![user_id])?;
        let mut stmt = tx.prepare(
            "INSERT INTO personal_records (user_id, exercise, weight) VALUES (?1, ?2, ?3)",
        )?;
        for (exercise, weight) in records.iter() {
            stmt.execute(params![user_id, exercise, weight.to_string()])?;
        }
        Ok(())
    }

    /// Row counts, for `focototal config` diagnostics
    pub fn get_stats(&self) -> StorageResult<DatabaseStats> {
        let count = |table: &str| -> StorageResult<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(usize::try_from(n).unwrap_or(0))
        };

        Ok(DatabaseStats {
            profile_count: count("profiles")?,
            workout_count: count("workouts")?,
            record_count: count("personal_records")?,
        })
    }
}

impl HistoryStore for Database {
    fn history(&self, user_id: &str) -> StorageResult<Vec<HistoricalWorkout>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT title, focus, duration_minutes, completed_at, exercises
            FROM workouts
            WHERE user_id = ?1
            ORDER BY completed_at DESC, rowid DESC
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, DateTime<Utc>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(title, focus, duration, completed_at, exercises)| -> StorageResult<HistoricalWorkout> {
                Ok(HistoricalWorkout {
                    title,
                    focus,
                    duration,
                    exercises: serde_json::from_str(&exercises)?,
                    completed_at,
                })
            })
            .collect()
    }

    fn append(&mut self, user_id: &str, workout: &HistoricalWorkout) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        Self::insert_workout(&tx, user_id, workout)?;
        tx.commit()?;
        Ok(())
    }
}

impl ProfileStore for Database {
    fn profile(&self, user_id: &str) -> StorageResult<Option<UserProfile>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, name, email, avatar_url, instagram, whatsapp, gallery,
                       level, xp, xp_to_next_level,
                       total_workouts, total_volume, time_spent, current_streak
                FROM profiles
                WHERE id = ?1
                "#,
                params![user_id],
                |row| {
                    Ok((
                        (
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, Option<String>>(3)?,
                            row.get::<_, Option<String>>(4)?,
                            row.get::<_, Option<String>>(5)?,
                            row.get::<_, String>(6)?,
                        ),
                        (
                            row.get::<_, u32>(7)?,
                            row.get::<_, i64>(8)?,
                            row.get::<_, i64>(9)?,
                            row.get::<_, u32>(10)?,
                            row.get::<_, i64>(11)?,
                            row.get::<_, i64>(12)?,
                            row.get::<_, u32>(13)?,
                        ),
                    ))
                },
            )
            .optional()?;

        let Some((identity, progress)) = row else {
            return Ok(None);
        };
        let (id, name, email, avatar_url, instagram, whatsapp, gallery) = identity;
        let (level, xp, xp_to_next_level, total_workouts, total_volume, time_spent, current_streak) =
            progress;

        let gallery: Vec<ProfileGalleryImage> = serde_json::from_str(&gallery)?;

        Ok(Some(UserProfile {
            id,
            name,
            email,
            avatar_url,
            instagram,
            whatsapp,
            gallery,
            level,
            xp: from_sql_int("profiles", "xp", xp)?,
            xp_to_next_level: from_sql_int("profiles", "xp_to_next_level", xp_to_next_level)?,
            stats: ProfileStats {
                total_workouts,
                total_volume: from_sql_int("profiles", "total_volume", total_volume)?,
                time_spent: from_sql_int("profiles", "time_spent", time_spent)?,
                current_streak,
            },
        }))
    }

    fn create_profile(&mut self, user_id: &str, profile: &UserProfile) -> StorageResult<()> {
        ensure_owner(user_id, profile)?;

        let tx = self.conn.transaction()?;
        if Self::profile_exists(&tx, user_id)? {
            return Err(StorageError::Duplicate {
                user_id: user_id.to_string(),
            });
        }

        tx.execute(
            r#"
            INSERT INTO profiles (
                id, name, email, avatar_url, instagram, whatsapp, gallery,
                level, xp, xp_to_next_level,
                total_workouts, total_volume, time_spent, current_streak
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                profile.id,
                profile.name,
                profile.email,
                profile.avatar_url,
                profile.instagram,
                profile.whatsapp,
                serde_json::to_string(&profile.gallery)?,
                profile.level,
                to_sql_int(profile.xp),
                to_sql_int(profile.xp_to_next_level),
                profile.stats.total_workouts,
                to_sql_int(profile.stats.total_volume),
                to_sql_int(profile.stats.time_spent),
                profile.stats.current_streak,
            ],
        )?;
        tx.commit()?;

        debug!(user_id, "Profile created");
        Ok(())
    }

    fn update_progress(&mut self, user_id: &str, update: &ProgressUpdate) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        Self::write_progress(&tx, user_id, update)?;
        tx.commit()?;
        Ok(())
    }
}

impl PersonalRecordsStore for Database {
    fn personal_records(&self, user_id: &str) -> StorageResult<PersonalRecords> {
        let mut stmt = self
            .conn
            .prepare("SELECT exercise, weight FROM personal_records WHERE user_id = ?1")?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(exercise, weight)| -> StorageResult<(String, Decimal)> {
                let weight = Decimal::from_str(&weight).map_err(|e| StorageError::Corrupted {
                    table: "personal_records".to_string(),
                    reason: format!("weight for {}: {}", exercise, e),
                })?;
                Ok((exercise, weight))
            })
            .collect()
    }

    fn replace_personal_records(
        &mut self,
        user_id: &str,
        records: &PersonalRecords,
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        Self::write_records(&tx, user_id, records)?;
        tx.commit()?;
        Ok(())
    }
}

impl CompletionStore for Database {
    fn commit_completion(
        &mut self,
        user_id: &str,
        workout: &HistoricalWorkout,
        update: &ProgressUpdate,
        records: &PersonalRecords,
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        // Any failure drops `tx`, which rolls everything back
        Self::write_progress(&tx, user_id, update)?;
        Self::insert_workout(&tx, user_id, workout)?;
        Self::write_records(&tx, user_id, records)?;

        tx.commit()?;
        debug!(user_id, records = records.len(), "Workout completion committed");
        Ok(())
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    pub profile_count: usize,
    pub workout_count: usize,
    pub record_count: usize,
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql_int(table: &str, column: &str, value: i64) -> StorageResult<u64> {
    u64::try_from(value).map_err(|_| StorageError::Corrupted {
        table: table.to_string(),
        reason: format!("negative {}: {}", column, value),
    })
}
