//! Custom workout plans and the weekly schedule
//!
//! A schedule maps days to plan ids. Generated weekly plans refer to their
//! plans by name instead; merging one in assigns fresh ids and rewrites the
//! schedule in terms of them.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::models::{Exercise, WorkoutPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        };
        write!(f, "{}", name)
    }
}

/// A user-authored plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomWorkoutPlan {
    pub id: String,
    pub name: String,
    pub exercises: Vec<Exercise>,
}

impl CustomWorkoutPlan {
    /// Plan ready to be performed; custom plans carry no nominal duration
    pub fn to_workout_plan(&self, focus: impl Into<String>) -> WorkoutPlan {
        WorkoutPlan {
            title: self.name.clone(),
            focus: focus.into(),
            duration: 0,
            exercises: self.exercises.clone(),
        }
    }
}

/// Day to plan id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklySchedule(BTreeMap<DayOfWeek, String>);

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, day: DayOfWeek, plan_id: impl Into<String>) {
        self.0.insert(day, plan_id.into());
    }

    pub fn clear(&mut self, day: DayOfWeek) {
        self.0.remove(&day);
    }

    pub fn plan_id(&self, day: DayOfWeek) -> Option<&str> {
        self.0.get(&day).map(String::as_str)
    }

    /// Plan scheduled for `day`, None for rest days and dangling ids
    pub fn plan_for<'a>(&self, day: DayOfWeek, plans: &'a [CustomWorkoutPlan]) -> Option<&'a CustomWorkoutPlan> {
        let id = self.plan_id(day)?;
        plans.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DayOfWeek, &str)> {
        self.0.iter().map(|(day, id)| (*day, id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A plan inside a generated week, identified only by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPlan {
    pub name: String,
    pub exercises: Vec<Exercise>,
}

/// Weekly plan as produced by the plan generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiGeneratedWeeklyPlan {
    pub plans: Vec<GeneratedPlan>,
    /// Day to plan name
    pub schedule: BTreeMap<DayOfWeek, String>,
}

/// Plans and schedule after merging a generated week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerUpdate {
    pub plans: Vec<CustomWorkoutPlan>,
    pub schedule: WeeklySchedule,
}

/// Merge a generated week into the user's plans, with random ids
pub fn merge_generated_plan(current: &[CustomWorkoutPlan], generated: AiGeneratedWeeklyPlan) -> PlannerUpdate {
    merge_generated_plan_with(current, generated, || Uuid::new_v4().to_string())
}

/// Merge a generated week using `next_id` for every new plan and exercise.
///
/// Existing plans are kept in front. The schedule is rebuilt from scratch:
/// each day points at the first new plan with the scheduled name, and days
/// naming no generated plan are dropped.
pub fn merge_generated_plan_with(
    current: &[CustomWorkoutPlan],
    generated: AiGeneratedWeeklyPlan,
    mut next_id: impl FnMut() -> String,
) -> PlannerUpdate {
    let new_plans: Vec<CustomWorkoutPlan> = generated
        .plans
        .into_iter()
        .map(|plan| CustomWorkoutPlan {
            id: next_id(),
            name: plan.name,
            exercises: plan
                .exercises
                .into_iter()
                .map(|exercise| Exercise {
                    id: Some(next_id()),
                    ..exercise
                })
                .collect(),
        })
        .collect();

    let mut schedule = WeeklySchedule::new();
    for (day, plan_name) in &generated.schedule {
        if let Some(plan) = new_plans.iter().find(|p| &p.name == plan_name) {
            schedule.assign(*day, plan.id.clone());
        }
    }

    let mut plans = current.to_vec();
    plans.extend(new_plans);

    PlannerUpdate { plans, schedule }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("id-{}", n)
        }
    }

    fn generated() -> AiGeneratedWeeklyPlan {
        AiGeneratedWeeklyPlan {
            plans: vec![
                GeneratedPlan {
                    name: "Upper A".to_string(),
                    exercises: vec![Exercise::new("Bench Press", "8"), Exercise::new("Row", "10")],
                },
                GeneratedPlan {
                    name: "Lower A".to_string(),
                    exercises: vec![Exercise::new("Squat", "5")],
                },
            ],
            schedule: [
                (DayOfWeek::Monday, "Upper A".to_string()),
                (DayOfWeek::Wednesday, "Lower A".to_string()),
                (DayOfWeek::Friday, "Upper A".to_string()),
                (DayOfWeek::Saturday, "Cardio".to_string()),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn test_merge_appends_with_fresh_ids() {
        let existing = vec![CustomWorkoutPlan {
            id: "mine".to_string(),
            name: "Upper A".to_string(),
            exercises: vec![],
        }];

        let update = merge_generated_plan_with(&existing, generated(), counter());

        let ids: Vec<&str> = update.plans.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["mine", "id-1", "id-4"]);
        assert_eq!(update.plans[1].exercises[0].id.as_deref(), Some("id-2"));
        assert_eq!(update.plans[1].exercises[1].id.as_deref(), Some("id-3"));
    }

    #[test]
    fn test_schedule_points_at_new_plans() {
        let existing = vec![CustomWorkoutPlan {
            id: "mine".to_string(),
            name: "Upper A".to_string(),
            exercises: vec![],
        }];

        let update = merge_generated_plan_with(&existing, generated(), counter());

        // Same-named existing plan is ignored, unknown names are dropped
        assert_eq!(update.schedule.plan_id(DayOfWeek::Monday), Some("id-1"));
        assert_eq!(update.schedule.plan_id(DayOfWeek::Friday), Some("id-1"));
        assert_eq!(update.schedule.plan_id(DayOfWeek::Wednesday), Some("id-4"));
        assert_eq!(update.schedule.plan_id(DayOfWeek::Saturday), None);
        assert_eq!(update.schedule.len(), 3);

        let monday = update.schedule.plan_for(DayOfWeek::Monday, &update.plans).unwrap();
        assert_eq!(monday.exercises.len(), 2);
        assert!(update.schedule.plan_for(DayOfWeek::Sunday, &update.plans).is_none());
    }

    #[test]
    fn test_random_ids_are_distinct() {
        let update = merge_generated_plan(&[], generated());
        assert_ne!(update.plans[0].id, update.plans[1].id);
    }

    #[test]
    fn test_schedule_json_shape() {
        let json = r#"{"plans":[{"name":"Full","exercises":[]}],"schedule":{"monday":"Full","sunday":"Rest"}}"#;
        let plan: AiGeneratedWeeklyPlan = serde_json::from_str(json).unwrap();
        let update = merge_generated_plan_with(&[], plan, counter());

        let value = serde_json::to_value(&update.schedule).unwrap();
        assert_eq!(value["monday"], "id-1");
        assert!(value.get("sunday").is_none());
    }

    #[test]
    fn test_custom_plan_defaults_duration() {
        let plan = CustomWorkoutPlan {
            id: "p".to_string(),
            name: "Arms".to_string(),
            exercises: vec![Exercise::new("Curl", "12")],
        };
        let workout = plan.to_workout_plan("Arms");
        assert_eq!(workout.duration, 0);
        assert_eq!(DayOfWeek::from(Weekday::Sun), DayOfWeek::Sunday);
    }
}
