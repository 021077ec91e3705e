//! Domain model for routines, sessions, and scheduled workouts.
//!
//! Persisted JSON uses camelCase field names (`routineId`, `lastPerformed`)
//! so existing stored data keeps loading unchanged. Foreign keys are plain
//! string ids; the store checks routine existence at the operation boundary
//! but the stored records themselves carry no referential integrity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::storage::HasId;

/// A single exercise inside a routine, with its current training targets.
///
/// Identity (`id`) is stable across progression updates; only `sets` and
/// `reps` are mutated by the progression engine. `weight` is user-adjusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Exercise {
    /// Create an exercise with a fresh id, validating targets.
    pub fn new(
        name: impl Into<String>,
        sets: u32,
        reps: u32,
        weight: f64,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyExerciseName);
        }
        if sets < 1 {
            return Err(ValidationError::InvalidValue {
                field: "sets".into(),
                message: "must be at least 1".into(),
            });
        }
        if reps < 1 {
            return Err(ValidationError::InvalidValue {
                field: "reps".into(),
                message: "must be at least 1".into(),
            });
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "weight".into(),
                message: "must be zero or positive".into(),
            });
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            sets,
            reps,
            weight,
            notes: None,
        })
    }
}

/// A named, ordered template of exercises.
///
/// Exercise order is user-significant (display order). `last_performed` is
/// updated only by the progression engine on session completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRoutine {
    pub id: String,
    pub name: String,
    pub exercises: Vec<Exercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_performed: Option<DateTime<Utc>>,
}

impl WorkoutRoutine {
    /// Create a routine with a fresh id, validating names.
    pub fn new(
        name: impl Into<String>,
        exercises: Vec<Exercise>,
    ) -> Result<Self, ValidationError> {
        let routine = Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            exercises,
            last_performed: None,
        };
        routine.validate()?;
        Ok(routine)
    }

    /// Check the routine and every exercise in it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyRoutineName);
        }
        for exercise in &self.exercises {
            if exercise.name.trim().is_empty() {
                return Err(ValidationError::EmptyExerciseName);
            }
        }
        Ok(())
    }
}

impl HasId for WorkoutRoutine {
    fn id(&self) -> &str {
        &self.id
    }
}

/// One logged set of an exercise: what was actually performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedSet {
    pub reps: u32,
    pub weight: f64,
}

/// Per-exercise log inside a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExercise {
    pub exercise_id: String,
    pub sets: Vec<LoggedSet>,
}

/// An immutable record of one completed workout.
///
/// Append-only history. The exercise-id set may be a subset of the owning
/// routine's current exercises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: String,
    pub routine_id: String,
    pub date: DateTime<Utc>,
    pub exercises: Vec<SessionExercise>,
}

impl WorkoutSession {
    pub fn new(
        routine_id: impl Into<String>,
        date: DateTime<Utc>,
        exercises: Vec<SessionExercise>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            routine_id: routine_id.into(),
            date,
            exercises,
        }
    }
}

impl HasId for WorkoutSession {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A calendar-bound intent to perform a routine on a specific date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledWorkout {
    pub id: String,
    pub routine_id: String,
    pub date: DateTime<Utc>,
}

impl ScheduledWorkout {
    pub fn new(routine_id: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            routine_id: routine_id.into(),
            date,
        }
    }
}

impl HasId for ScheduledWorkout {
    fn id(&self) -> &str {
        &self.id
    }
}
