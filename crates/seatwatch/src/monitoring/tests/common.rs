use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::MonitorConfig;
use crate::monitoring::alert::RenderedAlert;
use crate::monitoring::domain::{ClassName, ClassNumber, SeatStatus, SectionSnapshot};
use crate::monitoring::notifier::{DeliveryError, Notifier};
use crate::monitoring::registry::SectionRegistry;
use crate::monitoring::service::SeatMonitor;
use crate::monitoring::source::{FetchError, SnapshotSource};
use crate::monitoring::tracker::AlertKind;

pub(super) const TOPIC: &str = "seat-alerts";

pub(super) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 18, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn minutes(count: i64) -> chrono::Duration {
    chrono::Duration::minutes(count)
}

pub(super) fn section(number: &str, course: &str, status: SeatStatus) -> SectionSnapshot {
    SectionSnapshot {
        class_number: ClassNumber::new(number),
        class_name: ClassName::new(course),
        status,
        title: "Principles of Programming".to_string(),
        instructor: "Ada Lovelace".to_string(),
        seats: match status {
            SeatStatus::Open => "1 of 150".to_string(),
            _ => "0 of 150".to_string(),
        },
    }
}

pub(super) fn number(value: &str) -> ClassNumber {
    ClassNumber::new(value)
}

pub(super) fn registry_with(sections: &[SectionSnapshot]) -> SectionRegistry {
    let mut registry = SectionRegistry::new();
    for snapshot in sections {
        registry.upsert(snapshot.clone()).expect("valid section");
    }
    registry
}

pub(super) fn monitor_config() -> MonitorConfig {
    MonitorConfig {
        ntfy_topic: TOPIC.to_string(),
        fetch_timeout: Duration::from_millis(200),
        delivery_timeout: Duration::from_millis(200),
        ..MonitorConfig::default()
    }
}

/// Class search returning whatever the test scripted per course.
#[derive(Default)]
pub(super) struct ScriptedSource {
    courses: Mutex<HashMap<ClassName, Result<Vec<SectionSnapshot>, String>>>,
    calls: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedSource {
    pub(super) fn set(&self, course: &str, sections: Vec<SectionSnapshot>) {
        self.courses
            .lock()
            .expect("source mutex poisoned")
            .insert(ClassName::new(course), Ok(sections));
    }

    pub(super) fn fail(&self, course: &str) {
        self.courses
            .lock()
            .expect("source mutex poisoned")
            .insert(ClassName::new(course), Err("registrar offline".to_string()));
    }

    pub(super) fn stall(&self, delay: Duration) {
        *self.delay.lock().expect("source mutex poisoned") = Some(delay);
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SnapshotSource for ScriptedSource {
    async fn fetch(
        &self,
        class_name: &ClassName,
        _term: &str,
    ) -> Result<Vec<SectionSnapshot>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().expect("source mutex poisoned");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .courses
            .lock()
            .expect("source mutex poisoned")
            .get(class_name)
            .cloned();
        match scripted {
            Some(Ok(sections)) => Ok(sections),
            Some(Err(reason)) => Err(FetchError::Unavailable(reason)),
            None => Ok(Vec::new()),
        }
    }
}

/// Notifier that records every alert and optionally fails delivery.
#[derive(Default)]
pub(super) struct RecordingNotifier {
    events: Mutex<Vec<RenderedAlert>>,
    failing: Mutex<bool>,
}

impl RecordingNotifier {
    pub(super) fn events(&self) -> Vec<RenderedAlert> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn kinds(&self) -> Vec<AlertKind> {
        self.events().into_iter().map(|alert| alert.kind).collect()
    }

    pub(super) fn set_failing(&self, failing: bool) {
        *self.failing.lock().expect("notifier mutex poisoned") = failing;
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, alert: &RenderedAlert) -> Result<(), DeliveryError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(alert.clone());
        if *self.failing.lock().expect("notifier mutex poisoned") {
            return Err(DeliveryError::Status(503));
        }
        Ok(())
    }
}

pub(super) type TestMonitor = SeatMonitor<ScriptedSource, RecordingNotifier>;

pub(super) fn build_monitor() -> (TestMonitor, Arc<ScriptedSource>, Arc<RecordingNotifier>) {
    let source = Arc::new(ScriptedSource::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = SeatMonitor::new(source.clone(), notifier.clone(), &monitor_config());
    (monitor, source, notifier)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
