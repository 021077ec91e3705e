//! Key-value persistence for workout collections.
//!
//! Five fixed string keys, each holding one JSON-encoded collection. Every
//! write is a full synchronous overwrite of the key's value -- no diffing,
//! no versioning, no migrations. Reads fail soft: an absent key or malformed
//! stored JSON yields an empty collection (or default preferences) and a
//! logged warning, never an error.
//!
//! Dates are stored as RFC 3339 strings and reconstituted to
//! `DateTime<Utc>` on load.
//!
//! Read-modify-write sequences are not atomic; correctness assumes a single
//! active writer, which holds within one host process but not across several
//! sharing the same backing directory.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::{CoreError, StoreError, ValidationError};
use crate::notify::{Notification, NotificationPreferences};
use crate::progression::update_routine_progression;
use crate::workout::{ScheduledWorkout, WorkoutRoutine, WorkoutSession};

pub const ROUTINES_KEY: &str = "workout_routines";
pub const SESSIONS_KEY: &str = "workout_sessions";
pub const SCHEDULED_WORKOUTS_KEY: &str = "scheduled_workouts";
pub const NOTIFICATIONS_KEY: &str = "workout_notifications";
pub const NOTIFICATION_PREFS_KEY: &str = "notification_preferences";

/// Returns `~/.config/liftlog[-dev]/` based on LIFTLOG_ENV.
///
/// Set LIFTLOG_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("LIFTLOG_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("liftlog-dev")
    } else {
        base_dir.join("liftlog")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|err| StoreError::DataDir(format!("{}: {err}", dir.display())))?;
    Ok(dir)
}

/// Entities addressable by id within their collection.
pub trait HasId {
    fn id(&self) -> &str;
}

/// Raw string storage addressed by collection key.
pub trait KvBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per collection under the data directory.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open the backend at the default data directory.
    pub fn open() -> Result<Self, StoreError> {
        Ok(Self { dir: data_dir()? })
    }

    /// Open the backend at a custom directory.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::ReadFailed {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::write(self.path_for(key), value).map_err(|source| StoreError::WriteFailed {
            key: key.to_string(),
            source,
        })
    }
}

/// In-memory backend for tests and hosts without a home directory.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed store over a [`KvBackend`].
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct WorkoutStore {
    backend: Arc<dyn KvBackend>,
}

impl WorkoutStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }

    /// Open a file-backed store at the default data directory.
    pub fn open() -> Result<Self, StoreError> {
        Ok(Self::new(Arc::new(FileBackend::open()?)))
    }

    /// An in-memory store, empty until written.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    // ── Generic collection contract ──────────────────────────────────

    /// Load a collection, falling back to empty on absence or bad data.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.backend.read(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(items) => items,
                Err(err) => {
                    warn!(key, error = %err, "discarding malformed stored collection");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(key, error = %err, "failed to read stored collection");
                Vec::new()
            }
        }
    }

    /// Overwrite the whole collection. No partial or merge semantics.
    pub fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(items).map_err(|source| StoreError::EncodeFailed {
            key: key.to_string(),
            source,
        })?;
        self.backend.write(key, &raw)
    }

    /// Read-modify-write append.
    pub fn append<T: Serialize + DeserializeOwned>(
        &self,
        key: &str,
        item: T,
    ) -> Result<(), StoreError> {
        let mut items = self.load::<T>(key);
        items.push(item);
        self.save(key, &items)
    }

    /// Locate by id and replace in place. Returns `false` (no-op) when the
    /// id is not found.
    pub fn find_and_replace<T>(
        &self,
        key: &str,
        id: &str,
        update: impl FnOnce(&mut T),
    ) -> Result<bool, StoreError>
    where
        T: HasId + Serialize + DeserializeOwned,
    {
        let mut items = self.load::<T>(key);
        match items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                update(item);
                self.save(key, &items)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Filter out by id; saves only when the collection shrank.
    pub fn delete_by_id<T>(&self, key: &str, id: &str) -> Result<bool, StoreError>
    where
        T: HasId + Serialize + DeserializeOwned,
    {
        let items = self.load::<T>(key);
        let before = items.len();
        let kept: Vec<T> = items.into_iter().filter(|item| item.id() != id).collect();
        if kept.len() == before {
            return Ok(false);
        }
        self.save(key, &kept)?;
        Ok(true)
    }

    // ── Routines ─────────────────────────────────────────────────────

    pub fn routines(&self) -> Vec<WorkoutRoutine> {
        self.load(ROUTINES_KEY)
    }

    pub fn routine(&self, id: &str) -> Option<WorkoutRoutine> {
        self.routines().into_iter().find(|r| r.id == id)
    }

    /// Validate and append a new routine.
    pub fn create_routine(&self, routine: WorkoutRoutine) -> Result<(), CoreError> {
        routine.validate()?;
        self.append(ROUTINES_KEY, routine)?;
        Ok(())
    }

    /// Replace a stored routine wholesale. Returns `false` when unknown.
    pub fn update_routine(&self, routine: WorkoutRoutine) -> Result<bool, CoreError> {
        routine.validate()?;
        let id = routine.id.clone();
        let replaced =
            self.find_and_replace(ROUTINES_KEY, &id, |stored: &mut WorkoutRoutine| {
                *stored = routine;
            })?;
        Ok(replaced)
    }

    pub fn delete_routine(&self, id: &str) -> Result<bool, StoreError> {
        self.delete_by_id::<WorkoutRoutine>(ROUTINES_KEY, id)
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub fn sessions(&self) -> Vec<WorkoutSession> {
        self.load(SESSIONS_KEY)
    }

    /// Record a completed session, then apply progression to the owning
    /// routine and replace it in the store.
    ///
    /// Rejects sessions referencing a routine that does not exist.
    pub fn complete_session(&self, session: WorkoutSession) -> Result<(), CoreError> {
        let Some(routine) = self.routine(&session.routine_id) else {
            return Err(ValidationError::UnknownRoutine(session.routine_id.clone()).into());
        };

        self.append(SESSIONS_KEY, session.clone())?;

        let updated = update_routine_progression(&routine, &session);
        let id = updated.id.clone();
        self.find_and_replace(ROUTINES_KEY, &id, |stored: &mut WorkoutRoutine| {
            *stored = updated;
        })?;
        Ok(())
    }

    // ── Scheduled workouts ───────────────────────────────────────────

    pub fn scheduled_workouts(&self) -> Vec<ScheduledWorkout> {
        self.load(SCHEDULED_WORKOUTS_KEY)
    }

    /// Schedule a routine for a date. At most one workout per calendar day
    /// is enforced here, not by the store itself.
    pub fn schedule_workout(
        &self,
        routine_id: &str,
        date: DateTime<Utc>,
    ) -> Result<ScheduledWorkout, CoreError> {
        if routine_id.trim().is_empty() {
            return Err(ValidationError::NoRoutineSelected.into());
        }
        if self.routine(routine_id).is_none() {
            return Err(ValidationError::UnknownRoutine(routine_id.to_string()).into());
        }
        if self.workout_for_date(date).is_some() {
            return Err(ValidationError::DayAlreadyScheduled(date.date_naive()).into());
        }

        let scheduled = ScheduledWorkout::new(routine_id, date);
        self.append(SCHEDULED_WORKOUTS_KEY, scheduled.clone())?;
        Ok(scheduled)
    }

    pub fn unschedule_workout(&self, id: &str) -> Result<bool, StoreError> {
        self.delete_by_id::<ScheduledWorkout>(SCHEDULED_WORKOUTS_KEY, id)
    }

    /// The scheduled workout sharing a calendar day with `date`, if any.
    pub fn workout_for_date(&self, date: DateTime<Utc>) -> Option<ScheduledWorkout> {
        self.scheduled_workouts()
            .into_iter()
            .find(|w| w.date.date_naive() == date.date_naive())
    }

    // ── Notifications ────────────────────────────────────────────────

    pub fn notifications(&self) -> Vec<Notification> {
        self.load(NOTIFICATIONS_KEY)
    }

    pub fn save_notifications(&self, notifications: &[Notification]) -> Result<(), StoreError> {
        self.save(NOTIFICATIONS_KEY, notifications)
    }

    /// Load the preferences singleton, defaulting on absence or bad data.
    pub fn preferences(&self) -> NotificationPreferences {
        match self.backend.read(NOTIFICATION_PREFS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(prefs) => prefs,
                Err(err) => {
                    warn!(error = %err, "discarding malformed notification preferences");
                    NotificationPreferences::default()
                }
            },
            Ok(None) => NotificationPreferences::default(),
            Err(err) => {
                warn!(error = %err, "failed to read notification preferences");
                NotificationPreferences::default()
            }
        }
    }

    pub fn save_preferences(&self, prefs: &NotificationPreferences) -> Result<(), StoreError> {
        let raw =
            serde_json::to_string(prefs).map_err(|source| StoreError::EncodeFailed {
                key: NOTIFICATION_PREFS_KEY.to_string(),
                source,
            })?;
        self.backend.write(NOTIFICATION_PREFS_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::{Exercise, LoggedSet, SessionExercise};
    use chrono::TimeZone;

    fn routine(name: &str) -> WorkoutRoutine {
        WorkoutRoutine::new(name, vec![Exercise::new("Squat", 3, 10, 100.0).unwrap()]).unwrap()
    }

    #[test]
    fn load_returns_empty_for_absent_key() {
        let store = WorkoutStore::in_memory();
        assert!(store.routines().is_empty());
    }

    #[test]
    fn load_recovers_from_malformed_json() {
        let backend = Arc::new(MemoryBackend::new());
        backend.write(ROUTINES_KEY, "{not json").unwrap();
        let store = WorkoutStore::new(backend);
        assert!(store.routines().is_empty());
    }

    #[test]
    fn save_then_load_roundtrips_dates() {
        let store = WorkoutStore::in_memory();
        let mut r = routine("Leg Day");
        r.last_performed = Some(Utc.with_ymd_and_hms(2025, 1, 6, 18, 30, 0).unwrap());
        store.save(ROUTINES_KEY, std::slice::from_ref(&r)).unwrap();

        let loaded = store.routines();
        assert_eq!(loaded, vec![r]);
    }

    #[test]
    fn dates_are_stored_as_text() {
        let store = WorkoutStore::in_memory();
        let date = Utc.with_ymd_and_hms(2025, 1, 6, 18, 30, 0).unwrap();
        store
            .save(
                SCHEDULED_WORKOUTS_KEY,
                &[ScheduledWorkout::new("r-1", date)],
            )
            .unwrap();

        let raw: Vec<serde_json::Value> =
            store.load::<serde_json::Value>(SCHEDULED_WORKOUTS_KEY);
        assert!(raw[0]["date"].is_string());

        let reloaded = store.scheduled_workouts();
        assert_eq!(reloaded[0].date, date);
    }

    #[test]
    fn delete_by_id_reports_whether_anything_was_removed() {
        let store = WorkoutStore::in_memory();
        let r = routine("Leg Day");
        let id = r.id.clone();
        store.create_routine(r).unwrap();

        assert!(!store.delete_routine("missing").unwrap());
        assert_eq!(store.routines().len(), 1);

        assert!(store.delete_routine(&id).unwrap());
        assert!(store.routines().is_empty());
    }

    #[test]
    fn find_and_replace_is_a_noop_for_unknown_id() {
        let store = WorkoutStore::in_memory();
        store.create_routine(routine("Leg Day")).unwrap();

        let mut unknown = routine("Other");
        unknown.id = "missing".into();
        assert!(!store.update_routine(unknown).unwrap());
        assert_eq!(store.routines()[0].name, "Leg Day");
    }

    #[test]
    fn update_routine_replaces_whole_record() {
        let store = WorkoutStore::in_memory();
        let mut r = routine("Leg Day");
        store.create_routine(r.clone()).unwrap();

        r.name = "Leg Day v2".into();
        assert!(store.update_routine(r).unwrap());
        assert_eq!(store.routines()[0].name, "Leg Day v2");
    }

    #[test]
    fn complete_session_rejects_unknown_routine() {
        let store = WorkoutStore::in_memory();
        let session = WorkoutSession::new(
            "missing",
            Utc.with_ymd_and_hms(2025, 1, 6, 18, 0, 0).unwrap(),
            vec![],
        );
        let err = store.complete_session(session).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::UnknownRoutine(_))
        ));
        assert!(store.sessions().is_empty());
    }

    #[test]
    fn complete_session_appends_and_progresses() {
        let store = WorkoutStore::in_memory();
        let r = routine("Leg Day");
        let routine_id = r.id.clone();
        let exercise_id = r.exercises[0].id.clone();
        store.create_routine(r).unwrap();

        let date = Utc.with_ymd_and_hms(2025, 1, 6, 18, 0, 0).unwrap();
        let session = WorkoutSession::new(
            routine_id.clone(),
            date,
            vec![SessionExercise {
                exercise_id,
                sets: vec![LoggedSet {
                    reps: 10,
                    weight: 100.0,
                }],
            }],
        );
        store.complete_session(session).unwrap();

        assert_eq!(store.sessions().len(), 1);
        let stored = store.routine(&routine_id).unwrap();
        assert_eq!(stored.exercises[0].reps, 11);
        assert_eq!(stored.last_performed, Some(date));
    }

    #[test]
    fn schedule_workout_enforces_one_per_day() {
        let store = WorkoutStore::in_memory();
        let r = routine("Leg Day");
        let routine_id = r.id.clone();
        store.create_routine(r).unwrap();

        let morning = Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2025, 1, 6, 19, 0, 0).unwrap();
        store.schedule_workout(&routine_id, morning).unwrap();

        let err = store.schedule_workout(&routine_id, evening).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DayAlreadyScheduled(_))
        ));
        assert_eq!(store.scheduled_workouts().len(), 1);
    }

    #[test]
    fn schedule_workout_validates_routine() {
        let store = WorkoutStore::in_memory();
        let date = Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();

        assert!(matches!(
            store.schedule_workout("", date).unwrap_err(),
            CoreError::Validation(ValidationError::NoRoutineSelected)
        ));
        assert!(matches!(
            store.schedule_workout("missing", date).unwrap_err(),
            CoreError::Validation(ValidationError::UnknownRoutine(_))
        ));
    }

    #[test]
    fn workout_for_date_matches_by_calendar_day() {
        let store = WorkoutStore::in_memory();
        let r = routine("Leg Day");
        let routine_id = r.id.clone();
        store.create_routine(r).unwrap();

        let scheduled_at = Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
        store.schedule_workout(&routine_id, scheduled_at).unwrap();

        let same_day_later = Utc.with_ymd_and_hms(2025, 1, 6, 23, 0, 0).unwrap();
        assert!(store.workout_for_date(same_day_later).is_some());

        let next_day = Utc.with_ymd_and_hms(2025, 1, 7, 9, 0, 0).unwrap();
        assert!(store.workout_for_date(next_day).is_none());
    }

    #[test]
    fn preferences_default_when_absent_or_malformed() {
        let store = WorkoutStore::in_memory();
        assert_eq!(store.preferences(), NotificationPreferences::default());

        let backend = Arc::new(MemoryBackend::new());
        backend.write(NOTIFICATION_PREFS_KEY, "not json at all").unwrap();
        let store = WorkoutStore::new(backend);
        assert_eq!(store.preferences(), NotificationPreferences::default());
    }

    #[test]
    fn preferences_roundtrip() {
        let store = WorkoutStore::in_memory();
        let mut prefs = NotificationPreferences::default();
        prefs.rest_day_reminders = false;
        prefs.reminder_time = "06:30".into();
        store.save_preferences(&prefs).unwrap();
        assert_eq!(store.preferences(), prefs);
    }

    #[test]
    fn file_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            WorkoutStore::new(Arc::new(FileBackend::with_dir(dir.path().to_path_buf())));

        let r = routine("Leg Day");
        store.create_routine(r.clone()).unwrap();
        assert_eq!(store.routines(), vec![r]);

        // One file per collection key.
        assert!(dir.path().join("workout_routines.json").exists());
    }
}
