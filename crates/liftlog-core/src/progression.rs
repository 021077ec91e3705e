//! Auto-progression engine.
//!
//! A deterministic step function over an exercise's current targets: reps
//! climb to 12, then sets climb with reps reset to 3, capped at 6x12. The
//! reps and weights actually logged in a session do not influence the next
//! targets -- progression is schedule-based, not performance-adaptive.

use std::collections::HashSet;

use crate::workout::{Exercise, WorkoutRoutine, WorkoutSession};

pub const MAX_REPS: u32 = 12;
pub const MIN_REPS: u32 = 3;
pub const MAX_SETS: u32 = 6;

/// Compute the next training targets for an exercise.
///
/// At the ceiling (6 sets of 12 reps) the exercise is returned unchanged.
/// Weight is never touched; the user adjusts it manually.
pub fn calculate_progression(exercise: &Exercise) -> Exercise {
    let mut next = exercise.clone();

    if next.sets >= MAX_SETS && next.reps >= MAX_REPS {
        return next;
    }

    if next.reps < MAX_REPS {
        next.reps += 1;
    } else if next.sets < MAX_SETS {
        next.sets += 1;
        next.reps = MIN_REPS;
    }

    next
}

/// Apply progression across a routine after a completed session.
///
/// Only exercises whose id appears in the session are progressed; the rest
/// pass through unchanged. `last_performed` is always set to the session
/// date. The caller persists the returned routine.
pub fn update_routine_progression(
    routine: &WorkoutRoutine,
    session: &WorkoutSession,
) -> WorkoutRoutine {
    let performed: HashSet<&str> = session
        .exercises
        .iter()
        .map(|e| e.exercise_id.as_str())
        .collect();

    let mut updated = routine.clone();
    updated.exercises = routine
        .exercises
        .iter()
        .map(|exercise| {
            if performed.contains(exercise.id.as_str()) {
                calculate_progression(exercise)
            } else {
                exercise.clone()
            }
        })
        .collect();
    updated.last_performed = Some(session.date);

    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::{LoggedSet, SessionExercise};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn exercise(sets: u32, reps: u32) -> Exercise {
        Exercise {
            id: "ex-1".into(),
            name: "Squat".into(),
            sets,
            reps,
            weight: 100.0,
            notes: None,
        }
    }

    #[test]
    fn mid_range_step_increments_reps() {
        let next = calculate_progression(&exercise(3, 8));
        assert_eq!((next.sets, next.reps), (3, 9));
        assert_eq!(next.weight, 100.0);
    }

    #[test]
    fn max_reps_rolls_over_to_next_set() {
        let next = calculate_progression(&exercise(3, 12));
        assert_eq!((next.sets, next.reps), (4, 3));
    }

    #[test]
    fn ceiling_is_a_fixpoint() {
        let at_ceiling = exercise(6, 12);
        assert_eq!(calculate_progression(&at_ceiling), at_ceiling);
    }

    #[test]
    fn final_set_climbs_reps_to_ceiling() {
        let next = calculate_progression(&exercise(6, 11));
        assert_eq!((next.sets, next.reps), (6, 12));
    }

    #[test]
    fn identity_is_preserved() {
        let next = calculate_progression(&exercise(3, 8));
        assert_eq!(next.id, "ex-1");
        assert_eq!(next.name, "Squat");
    }

    #[test]
    fn routine_update_only_touches_performed_exercises() {
        let performed = exercise(3, 10);
        let skipped = Exercise {
            id: "ex-2".into(),
            name: "Lunge".into(),
            sets: 3,
            reps: 8,
            weight: 40.0,
            notes: None,
        };
        let routine = WorkoutRoutine {
            id: "r-1".into(),
            name: "Leg Day".into(),
            exercises: vec![performed.clone(), skipped.clone()],
            last_performed: None,
        };
        let date = Utc.with_ymd_and_hms(2025, 1, 6, 18, 30, 0).unwrap();
        let session = WorkoutSession::new(
            "r-1",
            date,
            vec![SessionExercise {
                exercise_id: "ex-1".into(),
                sets: vec![LoggedSet {
                    reps: 10,
                    weight: 100.0,
                }],
            }],
        );

        let updated = update_routine_progression(&routine, &session);
        assert_eq!(updated.exercises[0].reps, 11);
        assert_eq!(updated.exercises[1], skipped);
        assert_eq!(updated.last_performed, Some(date));
    }

    #[test]
    fn last_performed_is_set_even_for_empty_sessions() {
        let routine = WorkoutRoutine {
            id: "r-1".into(),
            name: "Leg Day".into(),
            exercises: vec![exercise(3, 10)],
            last_performed: None,
        };
        let date = Utc.with_ymd_and_hms(2025, 1, 6, 18, 30, 0).unwrap();
        let session = WorkoutSession::new("r-1", date, vec![]);

        let updated = update_routine_progression(&routine, &session);
        assert_eq!(updated.exercises, routine.exercises);
        assert_eq!(updated.last_performed, Some(date));
    }

    #[test]
    fn logged_performance_does_not_change_the_step() {
        // Two sessions logging wildly different weights/reps yield the same
        // next targets: progression reads only the current configuration.
        let routine = WorkoutRoutine {
            id: "r-1".into(),
            name: "Leg Day".into(),
            exercises: vec![exercise(3, 10)],
            last_performed: None,
        };
        let date = Utc.with_ymd_and_hms(2025, 1, 6, 18, 30, 0).unwrap();
        let heavy = WorkoutSession::new(
            "r-1",
            date,
            vec![SessionExercise {
                exercise_id: "ex-1".into(),
                sets: vec![LoggedSet {
                    reps: 20,
                    weight: 500.0,
                }],
            }],
        );
        let light = WorkoutSession::new(
            "r-1",
            date,
            vec![SessionExercise {
                exercise_id: "ex-1".into(),
                sets: vec![LoggedSet {
                    reps: 1,
                    weight: 0.0,
                }],
            }],
        );

        let after_heavy = update_routine_progression(&routine, &heavy);
        let after_light = update_routine_progression(&routine, &light);
        assert_eq!(after_heavy.exercises, after_light.exercises);
        assert_eq!(after_heavy.exercises[0].reps, 11);
    }

    proptest! {
        #[test]
        fn progression_is_monotonic_and_bounded(sets in 1u32..=6, reps in 1u32..=12) {
            let current = exercise(sets, reps);
            let next = calculate_progression(&current);

            prop_assert!(next.sets >= current.sets);
            prop_assert!(next.sets <= MAX_SETS);
            prop_assert!(next.reps <= MAX_REPS);
            // Reps only move backward when a set is added.
            if next.sets == current.sets {
                prop_assert!(next.reps >= current.reps);
            } else {
                prop_assert_eq!(next.reps, MIN_REPS);
            }
            prop_assert_eq!(next.weight, current.weight);
        }
    }
}
