use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use super::alert::RenderedAlert;
use super::domain::{ClassName, ClassNumber, SectionSnapshot};
use super::notifier::{dispatch, DispatchSummary, Notifier};
use super::source::{FetchError, SnapshotSource};
use super::store::TrackingStore;
use super::tracker::AlertKind;

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub groups: usize,
    pub failed_groups: Vec<ClassName>,
    pub refreshed: usize,
    pub alerts: usize,
    pub delivery: DispatchSummary,
}

/// Pulls fresh sections per course, merges them into the registry, and alerts on edges.
pub struct StatusReconciler<S: ?Sized, N: ?Sized> {
    store: TrackingStore,
    source: Arc<S>,
    notifier: Arc<N>,
    fetch_timeout: Duration,
    delivery_timeout: Duration,
}

impl<S, N> StatusReconciler<S, N>
where
    S: SnapshotSource + ?Sized,
    N: Notifier + ?Sized,
{
    pub fn new(
        store: TrackingStore,
        source: Arc<S>,
        notifier: Arc<N>,
        fetch_timeout: Duration,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            store,
            source,
            notifier,
            fetch_timeout,
            delivery_timeout,
        }
    }

    /// Fetch a course from the source, bounded by the fetch timeout.
    pub async fn fetch(
        &self,
        class_name: &ClassName,
        term: &str,
    ) -> Result<Vec<SectionSnapshot>, FetchError> {
        match tokio::time::timeout(self.fetch_timeout, self.source.fetch(class_name, term)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
        }
    }

    /// Refresh every tracked section, one fetch per course.
    ///
    /// A course whose fetch fails keeps its previous snapshots and tracker state; other
    /// courses are still applied. Sections missing from a successful fetch are left as they
    /// were.
    pub async fn reconcile(&self, now: DateTime<Utc>) -> ReconcileReport {
        let (term, groups) = {
            let state = self.store.lock();
            let mut groups: BTreeMap<ClassName, Vec<ClassNumber>> = BTreeMap::new();
            for snapshot in state.registry.all() {
                groups
                    .entry(snapshot.class_name)
                    .or_default()
                    .push(snapshot.class_number);
            }
            (state.settings.term.clone(), groups)
        };

        let mut report = ReconcileReport {
            groups: groups.len(),
            ..ReconcileReport::default()
        };
        if groups.is_empty() {
            debug!("no tracked sections; skipping status check");
            return report;
        }

        info!(groups = groups.len(), %term, "running background status check");

        let fetches = groups.iter().map(|(class_name, numbers)| {
            let term = term.as_str();
            async move { (class_name, numbers, self.fetch(class_name, term).await) }
        });
        let results = join_all(fetches).await;

        let mut alerts = Vec::new();
        for (class_name, numbers, result) in results {
            match result {
                Ok(fresh) => {
                    let (refreshed, group_alerts) = self.apply_group(&term, numbers, fresh, now);
                    report.refreshed += refreshed;
                    alerts.extend(group_alerts);
                }
                Err(err) => {
                    warn!(group = %class_name, error = %err, "class search failed; skipping course this cycle");
                    report.failed_groups.push(class_name.clone());
                }
            }
        }

        report.alerts = alerts.len();
        report.delivery = dispatch(self.notifier.as_ref(), alerts, self.delivery_timeout).await;
        report
    }

    /// Fetch and apply a single tracked section right away.
    ///
    /// The section keeps an (inactive) tracker state even when the fetch fails or does not
    /// include it.
    pub async fn check_now(
        &self,
        class_number: &ClassNumber,
        class_name: &ClassName,
        now: DateTime<Utc>,
    ) -> Option<RenderedAlert> {
        let term = {
            let mut state = self.store.lock();
            if state.registry.contains(class_number) {
                state.tracker.ensure(class_number);
            }
            state.settings.term.clone()
        };

        info!(%class_number, group = %class_name, "performing immediate check");

        let fresh = match self.fetch(class_name, &term).await {
            Ok(fresh) => fresh,
            Err(err) => {
                warn!(%class_number, error = %err, "immediate check failed; waiting for next cycle");
                return None;
            }
        };

        let numbers = [class_number.clone()];
        let (refreshed, mut alerts) = self.apply_group(&term, &numbers, fresh, now);
        if refreshed == 0 {
            debug!(%class_number, "section absent from immediate check result");
        }

        let alert = alerts.pop();
        if let Some(alert) = &alert {
            if alert.kind == AlertKind::SeatOpened {
                info!(%class_number, "newly tracked section is already open");
            }
            dispatch(
                self.notifier.as_ref(),
                vec![alert.clone()],
                self.delivery_timeout,
            )
            .await;
        }
        alert
    }

    /// Merge one course's fresh sections under a single lock acquisition.
    fn apply_group(
        &self,
        term: &str,
        numbers: &[ClassNumber],
        fresh: Vec<SectionSnapshot>,
        now: DateTime<Utc>,
    ) -> (usize, Vec<RenderedAlert>) {
        let mut fresh: HashMap<ClassNumber, SectionSnapshot> = fresh
            .into_iter()
            .map(|snapshot| (snapshot.class_number.clone(), snapshot))
            .collect();

        let mut state = self.store.lock();
        if state.settings.term != term {
            debug!(fetched_for = %term, current = %state.settings.term, "term changed during fetch; discarding results");
            return (0, Vec::new());
        }

        let topic = state.settings.ntfy_topic.clone();
        let mut refreshed = 0;
        let mut alerts = Vec::new();

        for class_number in numbers {
            if !state.registry.contains(class_number) {
                continue;
            }
            let Some(snapshot) = fresh.remove(class_number) else {
                continue;
            };

            if let Err(err) = state.registry.upsert(snapshot.clone()) {
                warn!(%class_number, error = %err, "discarding malformed section");
                continue;
            }
            refreshed += 1;

            if let Some(kind) = state
                .tracker
                .observe_tracked(class_number, snapshot.status, now)
            {
                info!(%class_number, kind = kind.label(), status = %snapshot.status, "status change");
                alerts.push(RenderedAlert::render(kind, &snapshot, None, &topic));
            }
        }

        (refreshed, alerts)
    }
}
