use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Duration recorded for a finished workout whose plan carried no duration
/// (custom plans are started with a duration of zero).
pub const DEFAULT_WORKOUT_DURATION_MINUTES: u32 = 45;

/// XP needed to leave level 1 on a freshly created profile
pub const INITIAL_XP_TO_NEXT_LEVEL: u64 = 100;

/// One executed (or skipped) set of an exercise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSet {
    /// Whether the set was actually performed
    pub checked: bool,

    /// Weight as typed by the user, parsed leniently
    #[serde(default)]
    pub weight: String,

    /// Optional reps override; the exercise's prescribed reps apply otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<String>,
}

impl CompletedSet {
    pub fn new(checked: bool, weight: impl Into<String>) -> Self {
        CompletedSet {
            checked,
            weight: weight.into(),
            reps: None,
        }
    }

    pub fn with_reps(mut self, reps: impl Into<String>) -> Self {
        self.reps = Some(reps.into());
        self
    }

    /// Weight of this set, zero when the input is not a number
    pub fn weight_value(&self) -> Decimal {
        parse_weight(&self.weight)
    }

    /// True when the weight text starts with a number, zero included
    pub fn has_numeric_weight(&self) -> bool {
        numeric_prefix(&self.weight, true).is_some()
    }

    /// Reps of this set, falling back to the exercise prescription
    pub fn reps_value(&self, prescribed: &str) -> u32 {
        let raw = self
            .reps
            .as_deref()
            .filter(|reps| !reps.is_empty())
            .unwrap_or(prescribed);
        parse_reps(raw)
    }
}

/// An exercise as performed inside a workout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    /// Plan-level identifier, absent on exercises from older records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Exercise name, matched exactly across workouts
    pub name: String,

    /// Prescribed reps ("10", "8-12", "30s", ...)
    #[serde(default)]
    pub reps: String,

    /// Prescribed sets, free text
    #[serde(default)]
    pub sets: String,

    /// Execution notes
    #[serde(default)]
    pub description: String,

    /// Sets logged while executing; absent when nothing was tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_sets: Option<Vec<CompletedSet>>,
}

impl Exercise {
    pub fn new(name: impl Into<String>, reps: impl Into<String>) -> Self {
        Exercise {
            id: None,
            name: name.into(),
            reps: reps.into(),
            sets: String::new(),
            description: String::new(),
            completed_sets: None,
        }
    }

    pub fn with_sets(mut self, sets: Vec<CompletedSet>) -> Self {
        self.completed_sets = Some(sets);
        self
    }

    /// All logged sets, checked or not
    pub fn logged_sets(&self) -> &[CompletedSet] {
        self.completed_sets.as_deref().unwrap_or(&[])
    }

    /// True when at least one set was logged for this exercise
    pub fn has_logged_sets(&self) -> bool {
        !self.logged_sets().is_empty()
    }

    /// Sets that were actually performed
    pub fn checked_sets(&self) -> impl Iterator<Item = &CompletedSet> {
        self.logged_sets().iter().filter(|set| set.checked)
    }

    /// Heaviest checked set, zero when nothing was performed
    pub fn max_checked_weight(&self) -> Decimal {
        self.checked_sets()
            .map(CompletedSet::weight_value)
            .fold(Decimal::ZERO, Decimal::max)
    }

    /// Sum of weight × reps over checked sets, saturating at `Decimal::MAX`
    pub fn checked_volume(&self) -> Decimal {
        self.checked_sets()
            .map(|set| set.weight_value().saturating_mul(Decimal::from(set.reps_value(&self.reps))))
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}

/// A workout as proposed by the generator or a custom plan, before it is run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub title: String,
    pub focus: String,
    /// Nominal duration in minutes, zero for custom plans
    pub duration: u32,
    pub exercises: Vec<Exercise>,
}

/// Immutable record of a completed session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalWorkout {
    /// Workout title
    pub title: String,

    /// Focus tag (e.g. "Upper body")
    pub focus: String,

    /// Nominal duration in minutes
    pub duration: u32,

    /// Exercises in the order they were performed
    pub exercises: Vec<Exercise>,

    /// Completion instant
    pub completed_at: DateTime<Utc>,
}

impl HistoricalWorkout {
    /// Stamp a finished plan with its completion time
    pub fn from_plan(plan: WorkoutPlan, completed_at: DateTime<Utc>) -> Self {
        let duration = if plan.duration > 0 {
            plan.duration
        } else {
            DEFAULT_WORKOUT_DURATION_MINUTES
        };

        HistoricalWorkout {
            title: plan.title,
            focus: plan.focus,
            duration,
            exercises: plan.exercises,
            completed_at,
        }
    }

    /// First exercise with the given name, exact match
    pub fn exercise(&self, name: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|exercise| exercise.name == name)
    }
}

/// Aggregate counters shown on the profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStats {
    /// Number of completed workouts
    pub total_workouts: u32,

    /// Lifetime lifted volume (weight × reps)
    pub total_volume: u64,

    /// Lifetime training time in minutes
    pub time_spent: u64,

    /// Consecutive calendar days with a workout
    pub current_streak: u32,
}

/// Photo attached to a profile gallery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileGalleryImage {
    pub id: String,
    pub src: String,
}

/// User profile with progression state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier (owner of every stored aggregate)
    pub id: String,

    /// Display name
    pub name: String,

    /// Contact e-mail
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,

    #[serde(default)]
    pub gallery: Vec<ProfileGalleryImage>,

    /// Current level, starts at 1
    pub level: u32,

    /// XP accumulated inside the current level
    pub xp: u64,

    /// XP required to reach the next level
    pub xp_to_next_level: u64,

    /// Aggregate counters
    pub stats: ProfileStats,
}

impl UserProfile {
    /// Fresh level-1 profile with empty stats
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        UserProfile {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            avatar_url: None,
            instagram: None,
            whatsapp: None,
            gallery: Vec::new(),
            level: 1,
            xp: 0,
            xp_to_next_level: INITIAL_XP_TO_NEXT_LEVEL,
            stats: ProfileStats::default(),
        }
    }

    /// Share of the current level already earned, as a percentage
    pub fn level_progress_percent(&self) -> Decimal {
        if self.xp_to_next_level == 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(self.xp) * Decimal::from(100) / Decimal::from(self.xp_to_next_level))
            .round_dp(1)
    }

    /// Progression fields written back after a workout
    pub fn progress_update(&self) -> ProgressUpdate {
        ProgressUpdate {
            level: self.level,
            xp: self.xp,
            xp_to_next_level: self.xp_to_next_level,
            stats: self.stats,
        }
    }
}

/// The subset of a profile the engine is allowed to change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub level: u32,
    pub xp: u64,
    pub xp_to_next_level: u64,
    pub stats: ProfileStats,
}

/// Best known weight per exercise name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonalRecords(BTreeMap<String, Decimal>);

impl PersonalRecords {
    pub fn new() -> Self {
        PersonalRecords(BTreeMap::new())
    }

    /// Stored record, zero when the exercise was never logged
    pub fn best(&self, exercise: &str) -> Decimal {
        self.0.get(exercise).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn contains(&self, exercise: &str) -> bool {
        self.0.contains_key(exercise)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(name, weight)| (name.as_str(), *weight))
    }

    pub(crate) fn set(&mut self, exercise: impl Into<String>, weight: Decimal) {
        self.0.insert(exercise.into(), weight);
    }
}

impl FromIterator<(String, Decimal)> for PersonalRecords {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        PersonalRecords(iter.into_iter().collect())
    }
}

/// Max weight and volume of one exercise in one workout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExercisePerformance {
    pub max_weight: Decimal,
    pub total_volume: Decimal,
}

/// Current vs. last performance of one exercise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseComparison {
    pub name: String,
    pub current: ExercisePerformance,
    /// None when the exercise was never logged before
    pub last: Option<ExercisePerformance>,
    pub is_new_pr: bool,
}

/// Post-workout summary shown to the user and used as the XP basis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutSummaryData {
    pub title: String,
    /// Total lifted volume, rounded to the nearest integer
    pub total_volume: u64,
    /// Duration in minutes
    pub duration: u32,
    pub exercises: Vec<ExerciseComparison>,
}

impl WorkoutSummaryData {
    /// Number of exercises flagged as a new personal record
    pub fn new_pr_count(&self) -> usize {
        self.exercises.iter().filter(|e| e.is_new_pr).count()
    }
}

/// One point of an exercise's strength curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseDataPoint {
    pub date: DateTime<Utc>,
    pub max_weight: Decimal,
}

/// Strength trend of one exercise across history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseProgress {
    pub name: String,
    /// Points in chronological order
    pub data: Vec<ExerciseDataPoint>,
    pub initial_weight: Decimal,
    pub current_weight: Decimal,
    /// current_weight - initial_weight
    pub evolution: Decimal,
    pub workout_count: usize,
}

/// Parse a weight the way a lenient form field would: the leading numeric
/// part counts ("62.5kg" is 62.5), anything unparsable or negative is zero.
pub fn parse_weight(raw: &str) -> Decimal {
    let Some(prefix) = numeric_prefix(raw, true) else {
        return Decimal::ZERO;
    };
    if prefix.negative {
        return Decimal::ZERO;
    }

    let integer = if prefix.integer.is_empty() { "0" } else { &prefix.integer };
    let literal = if prefix.fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, prefix.fraction)
    };

    Decimal::from_str(&literal).unwrap_or(Decimal::ZERO)
}

/// Parse a rep count from its leading integer ("8-12" is 8, "30s" is 30)
pub fn parse_reps(raw: &str) -> u32 {
    match numeric_prefix(raw, false) {
        Some(prefix) if !prefix.negative && !prefix.integer.is_empty() => {
            prefix.integer.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

struct NumericPrefix {
    negative: bool,
    integer: String,
    fraction: String,
}

fn numeric_prefix(raw: &str, allow_fraction: bool) -> Option<NumericPrefix> {
    let mut chars = raw.trim_start().chars().peekable();
    let mut prefix = NumericPrefix {
        negative: false,
        integer: String::new(),
        fraction: String::new(),
    };

    if let Some(&sign) = chars.peek() {
        if sign == '+' || sign == '-' {
            prefix.negative = sign == '-';
            chars.next();
        }
    }

    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        prefix.integer.push(c);
        chars.next();
    }

    if allow_fraction && chars.peek() == Some(&'.') {
        chars.next();
        while let Some(&c) = chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            prefix.fraction.push(c);
            chars.next();
        }
    }

    if prefix.integer.is_empty() && prefix.fraction.is_empty() {
        None
    } else {
        Some(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_weight_lenient() {
        assert_eq!(parse_weight("50"), dec!(50));
        assert_eq!(parse_weight("62.5"), dec!(62.5));
        assert_eq!(parse_weight(" 40kg"), dec!(40));
        assert_eq!(parse_weight(".5"), dec!(0.5));
        assert_eq!(parse_weight("12,5"), dec!(12));
        assert_eq!(parse_weight(""), Decimal::ZERO);
        assert_eq!(parse_weight("heavy"), Decimal::ZERO);
        assert_eq!(parse_weight("-20"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_reps_lenient() {
        assert_eq!(parse_reps("10"), 10);
        assert_eq!(parse_reps("8-12"), 8);
        assert_eq!(parse_reps("30s"), 30);
        assert_eq!(parse_reps("max"), 0);
        assert_eq!(parse_reps("-3"), 0);
        assert_eq!(parse_reps(""), 0);
    }

    #[test]
    fn test_reps_fall_back_to_prescription() {
        let set = CompletedSet::new(true, "20");
        assert_eq!(set.reps_value("12"), 12);

        let set = CompletedSet::new(true, "20").with_reps("6");
        assert_eq!(set.reps_value("12"), 6);

        let set = CompletedSet::new(true, "20").with_reps("");
        assert_eq!(set.reps_value("12"), 12);
    }

    #[test]
    fn test_unchecked_sets_ignored() {
        let exercise = Exercise::new("Squat", "10").with_sets(vec![
            CompletedSet::new(true, "50"),
            CompletedSet::new(false, "200"),
        ]);

        assert_eq!(exercise.max_checked_weight(), dec!(50));
        assert_eq!(exercise.checked_volume(), dec!(500));
        assert_eq!(exercise.checked_sets().count(), 1);
        assert!(exercise.has_logged_sets());
    }

    #[test]
    fn test_missing_sets_are_empty() {
        let exercise = Exercise::new("Plank", "30s");
        assert!(!exercise.has_logged_sets());
        assert_eq!(exercise.max_checked_weight(), Decimal::ZERO);
        assert_eq!(exercise.checked_volume(), Decimal::ZERO);
    }

    #[test]
    fn test_from_plan_defaults_duration() {
        let completed_at = Utc.with_ymd_and_hms(2024, 9, 23, 18, 0, 0).unwrap();
        let plan = WorkoutPlan {
            title: "Custom".to_string(),
            focus: "Personalizado".to_string(),
            duration: 0,
            exercises: vec![],
        };

        let workout = HistoricalWorkout::from_plan(plan, completed_at);
        assert_eq!(workout.duration, DEFAULT_WORKOUT_DURATION_MINUTES);
        assert_eq!(workout.completed_at, completed_at);
    }

    #[test]
    fn test_level_progress_percent() {
        let mut profile = UserProfile::new("u1", "Ana", "ana@example.com");
        profile.xp = 25;
        assert_eq!(profile.level_progress_percent(), dec!(25));

        profile.xp_to_next_level = 0;
        assert_eq!(profile.level_progress_percent(), Decimal::ZERO);
    }

    #[test]
    fn test_personal_records_serialize_as_map() {
        let records: PersonalRecords = vec![("Squat".to_string(), dec!(100))].into_iter().collect();
        let json = serde_json::to_string(&records).unwrap();
        assert_eq!(json, "{\"Squat\":\"100\"}");

        let back: PersonalRecords = serde_json::from_str(&json).unwrap();
        assert_eq!(back.best("Squat"), dec!(100));
        assert_eq!(back.best("Bench Press"), Decimal::ZERO);
    }

    #[test]
    fn test_workout_json_without_sets() {
        let json = r#"{
            "title": "Leg day",
            "focus": "Legs",
            "duration": 50,
            "exercises": [{"name": "Squat", "reps": "10"}],
            "completed_at": "2024-09-23T18:00:00Z"
        }"#;

        let workout: HistoricalWorkout = serde_json::from_str(json).unwrap();
        assert_eq!(workout.exercises.len(), 1);
        assert!(workout.exercises[0].completed_sets.is_none());
    }
}
