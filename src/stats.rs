//! Profile counters and streak continuity
//!
//! Streaks compare calendar days in the user's local offset, never elapsed
//! hours: a workout at 23:50 followed by one at 00:10 is a one-day step.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{HistoricalWorkout, ProfileStats, WorkoutSummaryData};

/// Visual intensity of a streak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreakTier {
    Cold,    // no streak
    Warm,    // 1-4 days
    Hot,     // 5-9 days
    Blazing, // 10+ days
}

impl StreakTier {
    pub fn from_streak(streak: u32) -> Self {
        match streak {
            0 => StreakTier::Cold,
            1..=4 => StreakTier::Warm,
            5..=9 => StreakTier::Hot,
            _ => StreakTier::Blazing,
        }
    }
}

/// Computes the stats a completed workout leads to
#[derive(Debug, Clone, Copy)]
pub struct StatsCalculator {
    offset: FixedOffset,
}

impl StatsCalculator {
    /// Calculator using UTC calendar days
    pub fn new() -> Self {
        StatsCalculator {
            offset: Utc.fix(),
        }
    }

    /// Calculator using the calendar days of a fixed UTC offset
    pub fn with_offset(offset: FixedOffset) -> Self {
        StatsCalculator { offset }
    }

    /// Calendar day of an instant in the configured offset
    pub fn calendar_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Streak after completing a workout at `now`.
    ///
    /// `last_completed_at` is the head of the history before this workout.
    pub fn next_streak(
        &self,
        last_completed_at: Option<DateTime<Utc>>,
        current_streak: u32,
        now: DateTime<Utc>,
    ) -> u32 {
        let Some(last) = last_completed_at else {
            return 1;
        };

        let today = self.calendar_day(now);
        let last_day = self.calendar_day(last);

        if today.pred_opt() == Some(last_day) {
            current_streak.saturating_add(1)
        } else if last_day == today {
            current_streak.max(1)
        } else {
            1
        }
    }

    /// Stats after appending `summary`'s workout to `prior_history`
    pub fn next_stats(
        &self,
        current: &ProfileStats,
        summary: &WorkoutSummaryData,
        prior_history: &[HistoricalWorkout],
        now: DateTime<Utc>,
    ) -> ProfileStats {
        let total_workouts = u32::try_from(prior_history.len() + 1).unwrap_or(u32::MAX);

        ProfileStats {
            total_workouts,
            total_volume: current.total_volume.saturating_add(summary.total_volume),
            time_spent: current.time_spent.saturating_add(u64::from(summary.duration)),
            current_streak: self.next_streak(
                prior_history.first().map(|w| w.completed_at),
                current.current_streak,
                now,
            ),
        }
    }
}

impl Default for StatsCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 23, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_yesterday_extends_streak() {
        let calc = StatsCalculator::new();
        let last = now() - Duration::days(1);
        assert_eq!(calc.next_streak(Some(last), 4, now()), 5);
    }

    #[test]
    fn test_same_day_keeps_streak() {
        let calc = StatsCalculator::new();
        let last = now() - Duration::hours(3);
        assert_eq!(calc.next_streak(Some(last), 4, now()), 4);
        assert_eq!(calc.next_streak(Some(last), 0, now()), 1);
    }

    #[test]
    fn test_gap_resets_streak() {
        let calc = StatsCalculator::new();
        let last = now() - Duration::days(3);
        assert_eq!(calc.next_streak(Some(last), 9, now()), 1);

        let two_days = now() - Duration::days(2);
        assert_eq!(calc.next_streak(Some(two_days), 9, now()), 1);
    }

    #[test]
    fn test_empty_history_starts_streak() {
        assert_eq!(StatsCalculator::new().next_streak(None, 7, now()), 1);
    }

    #[test]
    fn test_calendar_days_not_hours() {
        let calc = StatsCalculator::new();
        let late = Utc.with_ymd_and_hms(2024, 9, 22, 23, 50, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 9, 23, 0, 10, 0).unwrap();
        assert_eq!(calc.next_streak(Some(late), 2, early), 3);

        let morning = Utc.with_ymd_and_hms(2024, 9, 23, 0, 5, 0).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 9, 23, 23, 55, 0).unwrap();
        assert_eq!(calc.next_streak(Some(morning), 2, night), 2);
    }

    #[test]
    fn test_offset_moves_day_boundary() {
        // 02:00 UTC is still the previous evening at UTC-3
        let calc = StatsCalculator::with_offset(FixedOffset::west_opt(3 * 3600).unwrap());
        let last = Utc.with_ymd_and_hms(2024, 9, 22, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 9, 23, 2, 0, 0).unwrap();
        assert_eq!(calc.next_streak(Some(last), 3, now), 3);

        assert_eq!(StatsCalculator::new().next_streak(Some(last), 3, now), 4);
    }

    #[test]
    fn test_next_stats_accumulates() {
        let calc = StatsCalculator::new();
        let current = ProfileStats {
            total_workouts: 1,
            total_volume: 1000,
            time_spent: 40,
            current_streak: 1,
        };
        let summary = WorkoutSummaryData {
            title: "Legs".to_string(),
            total_volume: 2500,
            duration: 50,
            exercises: vec![],
        };
        let prior = vec![HistoricalWorkout {
            title: "Push".to_string(),
            focus: "Chest".to_string(),
            duration: 40,
            exercises: vec![],
            completed_at: now() - Duration::days(1),
        }];

        let stats = calc.next_stats(&current, &summary, &prior, now());

        assert_eq!(stats.total_workouts, 2);
        assert_eq!(stats.total_volume, 3500);
        assert_eq!(stats.time_spent, 90);
        assert_eq!(stats.current_streak, 2);
    }

    #[test]
    fn test_streak_tiers() {
        assert_eq!(StreakTier::from_streak(0), StreakTier::Cold);
        assert_eq!(StreakTier::from_streak(4), StreakTier::Warm);
        assert_eq!(StreakTier::from_streak(5), StreakTier::Hot);
        assert_eq!(StreakTier::from_streak(10), StreakTier::Blazing);
    }
}
