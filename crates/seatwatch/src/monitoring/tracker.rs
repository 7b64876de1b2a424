//! Per-section debounce and reminder throttle.
//!
//! Status changes are edge-triggered through [`NotificationTracker::observe`]; reminders are
//! level-triggered through [`NotificationTracker::tick`], which needs no fresh fetch, only the
//! elapsed time since the last alert for a section that is still open.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{ClassNumber, SeatStatus};
use super::registry::SectionRegistry;

/// Alerts per open streak, counting the opening alert itself.
pub const MAX_NOTIFICATIONS: u32 = 10;

/// Minimum time between two alerts for a section that stays open.
pub const REMINDER_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    SeatOpened,
    SeatClosed,
    Reminder,
}

impl AlertKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::SeatOpened => "SEAT_OPENED",
            Self::SeatClosed => "SEAT_CLOSED",
            Self::Reminder => "REMINDER",
        }
    }
}

/// Bookkeeping for one tracked section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationState {
    pub last_status: SeatStatus,
    /// Alerts sent during the current open streak. Ignored unless `last_status` is open.
    pub reminder_count: u32,
    pub last_sent_at: Option<DateTime<Utc>>,
}

impl Default for NotificationState {
    fn default() -> Self {
        Self {
            last_status: SeatStatus::INACTIVE,
            reminder_count: 0,
            last_sent_at: None,
        }
    }
}

/// Reminder owed for a section whose throttle window elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    pub class_number: ClassNumber,
    /// Alerts already sent in this streak when the reminder fired.
    pub count: u32,
    pub max: u32,
}

#[derive(Debug, Clone)]
pub struct NotificationTracker {
    states: HashMap<ClassNumber, NotificationState>,
    max_notifications: u32,
    reminder_interval: Duration,
}

impl Default for NotificationTracker {
    fn default() -> Self {
        Self::new(MAX_NOTIFICATIONS, REMINDER_INTERVAL)
    }
}

impl NotificationTracker {
    pub fn new(max_notifications: u32, reminder_interval: Duration) -> Self {
        Self {
            states: HashMap::new(),
            max_notifications,
            reminder_interval,
        }
    }

    pub fn max_notifications(&self) -> u32 {
        self.max_notifications
    }

    /// Materialize the inactive default state for `class_number` if none exists yet.
    pub fn ensure(&mut self, class_number: &ClassNumber) -> &mut NotificationState {
        self.states.entry(class_number.clone()).or_default()
    }

    /// Like [`Self::ensure`], but for callers that expect the state to already exist.
    ///
    /// A missing state is an internal defect: debug builds panic, release builds log and
    /// reinitialize.
    pub(crate) fn ensure_tracked(&mut self, class_number: &ClassNumber) -> &mut NotificationState {
        let present = self.states.contains_key(class_number);
        debug_assert!(
            present,
            "notification state missing for tracked section {class_number}"
        );
        if !present {
            warn!(%class_number, "notification state missing for tracked section; reinitializing");
        }
        self.ensure(class_number)
    }

    pub fn state(&self, class_number: &ClassNumber) -> Option<&NotificationState> {
        self.states.get(class_number)
    }

    pub fn contains(&self, class_number: &ClassNumber) -> bool {
        self.states.contains_key(class_number)
    }

    pub fn remove(&mut self, class_number: &ClassNumber) -> Option<NotificationState> {
        self.states.remove(class_number)
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Feed one observed status, returning the alert to send if it was an edge.
    ///
    /// Repeating the previous status is a no-op, so polling the same state never refires.
    pub fn observe(
        &mut self,
        class_number: &ClassNumber,
        status: SeatStatus,
        now: DateTime<Utc>,
    ) -> Option<AlertKind> {
        let state = self.ensure(class_number);
        Self::apply(state, class_number, status, now)
    }

    pub(crate) fn observe_tracked(
        &mut self,
        class_number: &ClassNumber,
        status: SeatStatus,
        now: DateTime<Utc>,
    ) -> Option<AlertKind> {
        let state = self.ensure_tracked(class_number);
        Self::apply(state, class_number, status, now)
    }

    fn apply(
        state: &mut NotificationState,
        class_number: &ClassNumber,
        status: SeatStatus,
        now: DateTime<Utc>,
    ) -> Option<AlertKind> {
        let previous = state.last_status;
        if status == previous {
            return None;
        }

        debug!(%class_number, from = %previous, to = %status, "status change");

        let alert = if status.is_open() {
            state.reminder_count = 1;
            state.last_sent_at = Some(now);
            Some(AlertKind::SeatOpened)
        } else if status == SeatStatus::Full && previous.is_open() {
            state.reminder_count = 0;
            state.last_sent_at = None;
            Some(AlertKind::SeatClosed)
        } else {
            None
        };

        state.last_status = status;
        alert
    }

    /// Collect reminders for every section still open whose throttle window elapsed.
    ///
    /// At most one reminder per section per call; a streak stops reminding once it has sent
    /// `max_notifications` alerts in total.
    pub fn tick(&mut self, now: DateTime<Utc>, registry: &SectionRegistry) -> Vec<DueReminder> {
        let max = self.max_notifications;
        let interval = self.reminder_interval;

        let mut due = Vec::new();
        for (class_number, state) in self.states.iter_mut() {
            let still_open = registry
                .get(class_number)
                .map(|snapshot| snapshot.status.is_open())
                .unwrap_or(false);
            if !still_open {
                continue;
            }
            if state.reminder_count == 0 || state.reminder_count >= max {
                continue;
            }

            let elapsed = match state.last_sent_at {
                Some(sent) => (now - sent).to_std().ok(),
                None => Some(Duration::MAX),
            };
            if !elapsed.map(|elapsed| elapsed >= interval).unwrap_or(false) {
                continue;
            }

            due.push(DueReminder {
                class_number: class_number.clone(),
                count: state.reminder_count,
                max,
            });
            state.reminder_count += 1;
            state.last_sent_at = Some(now);
        }

        due
    }
}
