use metrics_exporter_prometheus::PrometheusHandle;
use seatwatch::config::MonitorConfig;
use seatwatch::error::AppError;
use seatwatch::monitoring::{HttpSnapshotSource, NtfyNotifier, SeatMonitor};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type LiveMonitor = SeatMonitor<HttpSnapshotSource, NtfyNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn snapshot_source(config: &MonitorConfig) -> Result<HttpSnapshotSource, AppError> {
    Ok(HttpSnapshotSource::new(
        config.source_url.clone(),
        config.fetch_timeout,
    )?)
}

pub(crate) fn live_monitor(config: &MonitorConfig) -> Result<LiveMonitor, AppError> {
    let source = Arc::new(snapshot_source(config)?);
    let notifier = Arc::new(NtfyNotifier::new(
        config.ntfy_url.clone(),
        config.delivery_timeout,
    )?);
    Ok(SeatMonitor::new(source, notifier, config))
}
