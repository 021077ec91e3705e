//! # Liftlog Core Library
//!
//! Core business logic for Liftlog, a personal workout tracker. The hosting
//! UI is a thin layer over this crate: it calls the store for routine and
//! calendar operations and drives the notification scheduler's poll loop.
//!
//! ## Architecture
//!
//! - **Storage**: synchronous key-value persistence of JSON collections,
//!   one fixed key per collection, whole-collection overwrites
//! - **Progression Engine**: pure step function advancing an exercise's
//!   target reps/sets after each completed session (reps to 12, then sets
//!   to 6 with reps reset to 3)
//! - **Notification Scheduler**: level-triggered polling against wall-clock
//!   time; daily reminders, weekly progress summaries, and missed-workout
//!   alerts, each matching a single minute per day
//! - **Stats**: weekly completion rate and per-exercise history
//!
//! ## Key Components
//!
//! - [`WorkoutStore`]: typed store over a pluggable key-value backend
//! - [`NotificationService`]: scheduler with injected store and clock
//! - [`calculate_progression`] / [`update_routine_progression`]: the
//!   progression engine

pub mod clock;
pub mod error;
pub mod notify;
pub mod progression;
pub mod stats;
pub mod storage;
pub mod workout;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, Result, StoreError, ValidationError};
pub use notify::{
    Notification, NotificationPreferences, NotificationService, NotificationType, POLL_INTERVAL,
};
pub use progression::{calculate_progression, update_routine_progression};
pub use stats::{ExerciseHistory, ExercisePoint, WeeklyProgress};
pub use storage::{FileBackend, KvBackend, MemoryBackend, WorkoutStore};
pub use workout::{
    Exercise, LoggedSet, ScheduledWorkout, SessionExercise, WorkoutRoutine, WorkoutSession,
};
