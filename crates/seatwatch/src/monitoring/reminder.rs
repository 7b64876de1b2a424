use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::alert::{ReminderProgress, RenderedAlert};
use super::notifier::{dispatch, DispatchSummary, Notifier};
use super::store::TrackingStore;

/// Periodic driver for reminder alerts. Owns no state of its own.
pub struct ReminderTicker<N: ?Sized> {
    store: TrackingStore,
    notifier: Arc<N>,
    delivery_timeout: Duration,
}

impl<N> ReminderTicker<N>
where
    N: Notifier + ?Sized,
{
    pub fn new(store: TrackingStore, notifier: Arc<N>, delivery_timeout: Duration) -> Self {
        Self {
            store,
            notifier,
            delivery_timeout,
        }
    }

    /// Send every reminder whose throttle window has elapsed as of `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> DispatchSummary {
        let alerts = {
            let mut guard = self.store.lock();
            let state = &mut *guard;
            let topic = state.settings.ntfy_topic.as_str();
            state
                .tracker
                .tick(now, &state.registry)
                .into_iter()
                .filter_map(|due| {
                    let snapshot = state.registry.get(&due.class_number)?;
                    info!(class_number = %due.class_number, count = due.count, "sending hourly reminder");
                    Some(RenderedAlert::reminder(
                        snapshot,
                        ReminderProgress {
                            count: due.count,
                            max: due.max,
                        },
                        topic,
                    ))
                })
                .collect::<Vec<_>>()
        };

        if alerts.is_empty() {
            debug!("no reminders due");
            return DispatchSummary::default();
        }

        dispatch(self.notifier.as_ref(), alerts, self.delivery_timeout).await
    }
}
