//! Seat monitoring: debounced status alerts and throttled reminders for tracked sections.
//!
//! The scheduler drives two independent jobs over one shared [`TrackingStore`]: the
//! [`StatusReconciler`] refreshes sections from the class search and alerts on status edges,
//! while the [`ReminderTicker`] re-alerts for sections that stay open.

pub mod alert;
pub mod domain;
pub mod notifier;
pub mod reconciler;
pub mod registry;
pub mod reminder;
pub mod router;
pub mod scheduler;
pub mod service;
pub mod settings;
pub mod source;
pub mod store;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use alert::{ReminderProgress, RenderedAlert};
pub use domain::{ClassName, ClassNumber, SeatStatus, SectionSnapshot};
pub use notifier::{DeliveryError, DispatchSummary, Notifier, NtfyNotifier};
pub use reconciler::{ReconcileReport, StatusReconciler};
pub use registry::{RegistryError, SectionRegistry};
pub use reminder::ReminderTicker;
pub use router::monitor_router;
pub use scheduler::{Schedule, Scheduler};
pub use service::{MonitorError, MonitorStateView, SeatMonitor};
pub use settings::{term_name, MonitorSettings, SettingsOutcome, SettingsUpdate, SettingsView};
pub use source::{FetchError, HttpSnapshotSource, SnapshotSource};
pub use store::{TrackingState, TrackingStore};
pub use tracker::{
    AlertKind, DueReminder, NotificationState, NotificationTracker, MAX_NOTIFICATIONS,
    REMINDER_INTERVAL,
};
