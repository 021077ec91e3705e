//! Training analytics: weekly completion and per-exercise history.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

use crate::workout::{ScheduledWorkout, WorkoutRoutine, WorkoutSession};

/// Completed vs scheduled workouts over one week window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyProgress {
    pub completed: usize,
    pub scheduled: usize,
    /// Rounded percentage; 0 when nothing was scheduled.
    pub completion_pct: u32,
}

/// One data point in an exercise's history, derived from a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ExercisePoint {
    pub date: DateTime<Utc>,
    pub max_weight: f64,
    /// Sum of weight x reps across the session's sets.
    pub total_volume: f64,
}

/// Chronological history for one exercise id.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseHistory {
    pub name: String,
    pub points: Vec<ExercisePoint>,
}

/// Half-open week window `[Sunday 00:00, next Sunday 00:00)` containing `now`.
pub fn week_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let days_from_sunday = now.weekday().num_days_from_sunday() as i64;
    let start = (now.date_naive() - Duration::days(days_from_sunday))
        .and_time(NaiveTime::MIN)
        .and_utc();
    (start, start + Duration::days(7))
}

/// Completion rate for the week containing `now`.
pub fn weekly_progress(
    sessions: &[WorkoutSession],
    scheduled: &[ScheduledWorkout],
    now: DateTime<Utc>,
) -> WeeklyProgress {
    let (start, end) = week_window(now);
    let in_window = |date: DateTime<Utc>| date >= start && date < end;

    let completed = sessions.iter().filter(|s| in_window(s.date)).count();
    let scheduled = scheduled.iter().filter(|w| in_window(w.date)).count();
    let completion_pct = if scheduled == 0 {
        0
    } else {
        ((completed as f64 / scheduled as f64) * 100.0).round() as u32
    };

    WeeklyProgress {
        completed,
        scheduled,
        completion_pct,
    }
}

/// Per-exercise history points across all sessions, keyed by exercise id.
///
/// Names are resolved through the routines; an exercise no longer present in
/// any routine keeps its points under "Unknown Exercise".
pub fn exercise_history(
    sessions: &[WorkoutSession],
    routines: &[WorkoutRoutine],
) -> HashMap<String, ExerciseHistory> {
    let mut names: HashMap<&str, &str> = HashMap::new();
    for routine in routines {
        for exercise in &routine.exercises {
            names.insert(&exercise.id, &exercise.name);
        }
    }

    let mut history: HashMap<String, ExerciseHistory> = HashMap::new();
    for session in sessions {
        for logged in &session.exercises {
            let max_weight = logged
                .sets
                .iter()
                .map(|s| s.weight)
                .fold(0.0_f64, f64::max);
            let total_volume = logged
                .sets
                .iter()
                .map(|s| s.weight * s.reps as f64)
                .sum();

            let entry = history
                .entry(logged.exercise_id.clone())
                .or_insert_with(|| ExerciseHistory {
                    name: names
                        .get(logged.exercise_id.as_str())
                        .map_or_else(|| "Unknown Exercise".to_string(), |n| (*n).to_string()),
                    points: Vec::new(),
                });
            entry.points.push(ExercisePoint {
                date: session.date,
                max_weight,
                total_volume,
            });
        }
    }

    for entry in history.values_mut() {
        entry.points.sort_by_key(|p| p.date);
    }
    history
}
