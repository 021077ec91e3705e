//! Notification records, preferences, and the poll-driven scheduler.
//!
//! The scheduler is level-triggered polling against wall-clock time: the
//! caller invokes [`NotificationService::tick`] periodically (or runs the
//! built-in 60 s [`NotificationService::run`] loop) and each check fires when
//! the current minute matches its trigger. If nothing ticks during the
//! trigger minute the notification for that day is silently skipped -- there
//! is no catch-up or backfill. Preferences are read fresh from the store on
//! every tick, so a preference change takes effect on the next tick without
//! restarting the loop.

mod messages;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::stats;
use crate::storage::{HasId, WorkoutStore};

/// Poll interval for the built-in scheduler loop.
pub const POLL_INTERVAL: StdDuration = StdDuration::from_secs(60);

/// Kind of generated notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    WorkoutReminder,
    ProgressUpdate,
    RestDay,
    MissedWorkout,
}

/// A durable notification record. Mutated only to flip `read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub date: DateTime<Utc>,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

impl Notification {
    pub fn new(
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        action_url: Option<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            title: title.into(),
            message: message.into(),
            date,
            read: false,
            action_url,
        }
    }
}

impl HasId for Notification {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Per-user notification preferences (process-wide singleton record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub workout_reminders: bool,
    #[serde(default = "default_true")]
    pub progress_updates: bool,
    #[serde(default = "default_true")]
    pub rest_day_reminders: bool,
    #[serde(default = "default_true")]
    pub missed_workout_alerts: bool,
    /// Daily reminder trigger, "HH:MM".
    #[serde(default = "default_reminder_time")]
    pub reminder_time: String,
    #[serde(default = "default_true")]
    pub weekly_digest: bool,
}

fn default_true() -> bool {
    true
}

fn default_reminder_time() -> String {
    "08:00".to_string()
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            workout_reminders: true,
            progress_updates: true,
            rest_day_reminders: true,
            missed_workout_alerts: true,
            reminder_time: default_reminder_time(),
            weekly_digest: true,
        }
    }
}

/// Notification scheduler and notification-list operations.
///
/// Holds an injected store and clock; no ambient global state. Cloneable --
/// clones share the same backend and clock.
#[derive(Clone)]
pub struct NotificationService {
    store: WorkoutStore,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    pub fn new(store: WorkoutStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn with_system_clock(store: WorkoutStore) -> Self {
        Self::new(store, Arc::new(SystemClock))
    }

    // ── Notification list ────────────────────────────────────────────

    /// All stored notifications, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.store.notifications()
    }

    pub fn unread_count(&self) -> usize {
        self.notifications().iter().filter(|n| !n.read).count()
    }

    /// Create and persist a notification, prepending it to the list.
    pub fn create(
        &self,
        kind: NotificationType,
        title: &str,
        message: &str,
        action_url: Option<&str>,
    ) -> Result<Notification, StoreError> {
        let notification = Notification::new(
            kind,
            title,
            message,
            action_url.map(str::to_string),
            self.clock.now(),
        );
        let mut all = self.store.notifications();
        all.insert(0, notification.clone());
        self.store.save_notifications(&all)?;
        Ok(notification)
    }

    /// Flip `read` on one notification. Returns `false` when unknown.
    pub fn mark_as_read(&self, id: &str) -> Result<bool, StoreError> {
        let mut all = self.store.notifications();
        match all.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                self.store.save_notifications(&all)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn mark_all_as_read(&self) -> Result<(), StoreError> {
        let mut all = self.store.notifications();
        for n in &mut all {
            n.read = true;
        }
        self.store.save_notifications(&all)
    }

    /// Delete one notification. Returns `false` when unknown.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.store
            .delete_by_id::<Notification>(crate::storage::NOTIFICATIONS_KEY, id)
    }

    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.store.save_notifications(&[])
    }

    // ── Preferences ──────────────────────────────────────────────────

    pub fn preferences(&self) -> NotificationPreferences {
        self.store.preferences()
    }

    pub fn update_preferences(
        &self,
        prefs: NotificationPreferences,
    ) -> Result<(), StoreError> {
        self.store.save_preferences(&prefs)
    }

    // ── Ad hoc creation with the same-day duplicate guard ────────────

    /// Whether a notification of `kind` dated `day` already exists.
    pub fn has_notification_on(&self, kind: NotificationType, day: NaiveDate) -> bool {
        self.notifications()
            .iter()
            .any(|n| n.kind == kind && n.date.date_naive() == day)
    }

    /// Opportunistic reminder for today (the host calls this on startup,
    /// independent of the poll loop): a workout reminder when something is
    /// scheduled, a rest-day nudge otherwise. Guarded by the same-day
    /// duplicate check, so at most one notification of either type per day
    /// comes from this path. Every ad hoc creation outside the poll loop
    /// must go through this guard.
    pub fn ensure_todays_reminder(&self) -> Result<Option<Notification>, StoreError> {
        let prefs = self.store.preferences();
        if !prefs.enabled {
            return Ok(None);
        }

        let now = self.clock.now();
        let today = now.date_naive();
        // The two branches are gated independently: workout_reminders for a
        // scheduled day, rest_day_reminders for an empty one.
        match self.store.workout_for_date(now) {
            Some(scheduled) => {
                if !prefs.workout_reminders {
                    return Ok(None);
                }
                let Some(routine) = self.store.routine(&scheduled.routine_id) else {
                    return Ok(None);
                };
                if self.has_notification_on(NotificationType::WorkoutReminder, today) {
                    return Ok(None);
                }
                self.create(
                    NotificationType::WorkoutReminder,
                    &format!("Today's Workout: {}", routine.name),
                    &format!(
                        "Your {} workout is scheduled for today. Get ready to crush it!",
                        routine.name
                    ),
                    Some(&format!("/workout?routineId={}", routine.id)),
                )
                .map(Some)
            }
            None if prefs.rest_day_reminders => {
                if self.has_notification_on(NotificationType::RestDay, today) {
                    return Ok(None);
                }
                self.create(
                    NotificationType::RestDay,
                    "Rest Day",
                    "No workout scheduled for today. Take it easy and recover!",
                    Some("/calendar"),
                )
                .map(Some)
            }
            None => Ok(None),
        }
    }

    // ── Poll checks ──────────────────────────────────────────────────

    /// Run all three time-windowed checks against the current clock reading.
    ///
    /// Returns the notifications emitted this tick so the host can forward
    /// them to an ephemeral alert surface. Each check matches a single
    /// minute, so under a 60 s poll each fires at most once per qualifying
    /// day.
    pub fn tick(&self) -> Result<Vec<Notification>, StoreError> {
        let now = self.clock.now();
        let prefs = self.store.preferences();

        let mut emitted = Vec::new();
        if let Some(n) = self.check_daily_reminder(&prefs, now)? {
            emitted.push(n);
        }
        if let Some(n) = self.check_weekly_progress(&prefs, now)? {
            emitted.push(n);
        }
        if let Some(n) = self.check_missed_workout(&prefs, now)? {
            emitted.push(n);
        }
        Ok(emitted)
    }

    /// Drive [`tick`](Self::tick) every 60 seconds until `shutdown` flips to
    /// `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick() {
                        Ok(emitted) if !emitted.is_empty() => {
                            debug!(count = emitted.len(), "emitted notifications");
                        }
                        Ok(_) => {}
                        Err(err) => warn!(error = %err, "notification tick failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }

    /// Daily reminder at `reminder_time`: workout reminder when something is
    /// scheduled today, rest-day nudge otherwise.
    fn check_daily_reminder(
        &self,
        prefs: &NotificationPreferences,
        now: DateTime<Utc>,
    ) -> Result<Option<Notification>, StoreError> {
        if !prefs.enabled || !prefs.workout_reminders {
            return Ok(None);
        }
        let Some((hour, minute)) = parse_reminder_time(&prefs.reminder_time) else {
            warn!(reminder_time = %prefs.reminder_time, "ignoring unparseable reminder time");
            return Ok(None);
        };
        if now.hour() != hour || now.minute() != minute {
            return Ok(None);
        }

        match self.store.workout_for_date(now) {
            Some(scheduled) => {
                let Some(routine) = self.store.routine(&scheduled.routine_id) else {
                    return Ok(None);
                };
                self.create(
                    NotificationType::WorkoutReminder,
                    &format!("Time for your {} workout!", routine.name),
                    &messages::workout_reminder(&routine.name),
                    Some(&format!("/workout?routineId={}", routine.id)),
                )
                .map(Some)
            }
            None if prefs.rest_day_reminders => self
                .create(
                    NotificationType::RestDay,
                    "Rest Day",
                    &messages::rest_day(),
                    Some("/calendar"),
                )
                .map(Some),
            None => Ok(None),
        }
    }

    /// Weekly summary on Sunday at 18:00: completed vs scheduled over the
    /// Sunday-start week window.
    fn check_weekly_progress(
        &self,
        prefs: &NotificationPreferences,
        now: DateTime<Utc>,
    ) -> Result<Option<Notification>, StoreError> {
        if !prefs.enabled || !prefs.progress_updates {
            return Ok(None);
        }
        if now.weekday() != Weekday::Sun || now.hour() != 18 || now.minute() != 0 {
            return Ok(None);
        }

        let progress =
            stats::weekly_progress(&self.store.sessions(), &self.store.scheduled_workouts(), now);
        self.create(
            NotificationType::ProgressUpdate,
            "Weekly Progress Update",
            &format!(
                "You've completed {}/{} workouts this week ({}%). Keep up the good work!",
                progress.completed, progress.scheduled, progress.completion_pct
            ),
            Some("/progress"),
        )
        .map(Some)
    }

    /// Missed-workout check at 23:55: a workout scheduled yesterday with no
    /// matching session dated yesterday.
    fn check_missed_workout(
        &self,
        prefs: &NotificationPreferences,
        now: DateTime<Utc>,
    ) -> Result<Option<Notification>, StoreError> {
        if !prefs.enabled || !prefs.missed_workout_alerts {
            return Ok(None);
        }
        if now.hour() != 23 || now.minute() != 55 {
            return Ok(None);
        }

        let yesterday = (now - Duration::days(1)).date_naive();
        let Some(scheduled) = self
            .store
            .scheduled_workouts()
            .into_iter()
            .find(|w| w.date.date_naive() == yesterday)
        else {
            return Ok(None);
        };

        let completed = self
            .store
            .sessions()
            .iter()
            .any(|s| s.routine_id == scheduled.routine_id && s.date.date_naive() == yesterday);
        if completed {
            return Ok(None);
        }
        let Some(routine) = self.store.routine(&scheduled.routine_id) else {
            return Ok(None);
        };

        self.create(
            NotificationType::MissedWorkout,
            "Missed Workout",
            &format!(
                "You missed your {} workout yesterday. Would you like to reschedule it?",
                routine.name
            ),
            Some("/calendar"),
        )
        .map(Some)
    }
}

fn parse_reminder_time(value: &str) -> Option<(u32, u32)> {
    let (hour, minute) = value.split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}
