use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::alert::RenderedAlert;
use super::domain::{ClassName, ClassNumber, SectionSnapshot};
use super::notifier::{DispatchSummary, Notifier};
use super::reconciler::{ReconcileReport, StatusReconciler};
use super::registry::RegistryError;
use super::reminder::ReminderTicker;
use super::scheduler::{Schedule, Scheduler};
use super::settings::{MonitorSettings, SettingsOutcome, SettingsUpdate, SettingsView};
use super::source::{FetchError, SnapshotSource};
use super::store::TrackingStore;
use super::tracker::{NotificationState, NotificationTracker};
use crate::config::MonitorConfig;

/// Service composing the tracking store, reconciler, and reminder ticker.
pub struct SeatMonitor<S: ?Sized, N: ?Sized> {
    store: TrackingStore,
    reconciler: Arc<StatusReconciler<S, N>>,
    reminders: Arc<ReminderTicker<N>>,
    schedule: Schedule,
}

/// Everything the dashboard needs in one read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStateView {
    pub settings: SettingsView,
    pub tracked_classes: Vec<SectionSnapshot>,
}

impl<S, N> SeatMonitor<S, N>
where
    S: SnapshotSource + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, notifier: Arc<N>, config: &MonitorConfig) -> Self {
        let store = TrackingStore::new(
            MonitorSettings {
                term: config.term.clone(),
                ntfy_topic: config.ntfy_topic.clone(),
            },
            NotificationTracker::new(config.max_notifications, config.reminder_interval),
        );

        let reconciler = Arc::new(StatusReconciler::new(
            store.clone(),
            source,
            notifier.clone(),
            config.fetch_timeout,
            config.delivery_timeout,
        ));
        let reminders = Arc::new(ReminderTicker::new(
            store.clone(),
            notifier,
            config.delivery_timeout,
        ));

        Self {
            store,
            reconciler,
            reminders,
            schedule: Schedule {
                reconcile_every: config.reconcile_interval,
                remind_every: config.reminder_tick,
            },
        }
    }

    /// Start tracking a section and check it against the class search immediately.
    ///
    /// A section that is already open alerts now rather than on the next scheduled cycle.
    /// Re-tracking a section keeps its snapshot and notification history.
    pub async fn track(
        &self,
        snapshot: SectionSnapshot,
    ) -> Result<Vec<SectionSnapshot>, MonitorError> {
        let class_number = snapshot.class_number.clone();
        let class_name = snapshot.class_name.clone();

        {
            let mut state = self.store.lock();
            if !state.registry.contains(&class_number) {
                state.registry.upsert(snapshot)?;
            }
            state.tracker.ensure(&class_number);
        }
        info!(%class_number, "added section to tracking list");

        self.reconciler
            .check_now(&class_number, &class_name, Utc::now())
            .await;

        Ok(self.tracked())
    }

    /// Stop tracking a section, discarding its notification history. Idempotent.
    pub fn untrack(&self, class_number: &ClassNumber) -> Vec<SectionSnapshot> {
        {
            let mut state = self.store.lock();
            state.registry.remove(class_number);
            state.tracker.remove(class_number);
        }
        info!(%class_number, "removed section from tracking list");
        self.tracked()
    }

    /// Tracked sections ordered by class number.
    pub fn tracked(&self) -> Vec<SectionSnapshot> {
        let mut sections = self.store.lock().registry.all();
        sections.sort_by(|a, b| a.class_number.cmp(&b.class_number));
        sections
    }

    pub fn state_view(&self) -> MonitorStateView {
        let settings = self.store.lock().settings.view();
        MonitorStateView {
            settings,
            tracked_classes: self.tracked(),
        }
    }

    pub fn notification_state(&self, class_number: &ClassNumber) -> Option<NotificationState> {
        self.store.lock().tracker.state(class_number).cloned()
    }

    /// Apply a settings change. Switching terms drops every tracked section.
    pub fn update_settings(&self, update: SettingsUpdate) -> SettingsOutcome {
        let mut state = self.store.lock();
        let mut term_changed = false;

        if let Some(term) = update.term {
            if term != state.settings.term {
                info!(from = %state.settings.term, to = %term, "term changed; clearing tracked sections");
                state.settings.term = term;
                state.clear_tracking();
                term_changed = true;
            }
        }
        if let Some(topic) = update.ntfy_topic {
            state.settings.ntfy_topic = topic;
        }

        SettingsOutcome {
            message: "Settings updated",
            term_name: state.settings.view().term_name,
            term_changed,
        }
    }

    /// Look up a course in the class search for the current term.
    pub async fn search(&self, class_name: &ClassName) -> Result<Vec<SectionSnapshot>, MonitorError> {
        let term = self.store.lock().settings.term.clone();
        let sections = self.reconciler.fetch(class_name, &term).await?;
        Ok(sections)
    }

    pub async fn reconcile(&self, now: DateTime<Utc>) -> ReconcileReport {
        self.reconciler.reconcile(now).await
    }

    pub async fn check_now(
        &self,
        class_number: &ClassNumber,
        class_name: &ClassName,
        now: DateTime<Utc>,
    ) -> Option<RenderedAlert> {
        self.reconciler.check_now(class_number, class_name, now).await
    }

    pub async fn remind(&self, now: DateTime<Utc>) -> DispatchSummary {
        self.reminders.run(now).await
    }

    /// Spawn the background status-check and reminder jobs.
    pub fn start_scheduler(&self) -> Scheduler {
        Scheduler::start(
            self.reconciler.clone(),
            self.reminders.clone(),
            self.schedule,
        )
    }
}

/// Error raised by the seat monitor service.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
