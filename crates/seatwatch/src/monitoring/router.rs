use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde_json::json;

use super::domain::{ClassName, ClassNumber, SectionSnapshot};
use super::notifier::Notifier;
use super::registry::RegistryError;
use super::service::{MonitorError, SeatMonitor};
use super::settings::SettingsUpdate;
use super::source::SnapshotSource;

/// Router builder exposing the dashboard API for tracking sections.
pub fn monitor_router<S, N>(service: Arc<SeatMonitor<S, N>>) -> Router
where
    S: SnapshotSource + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    Router::new()
        .route("/api/state", get(state_handler::<S, N>))
        .route("/api/settings", post(settings_handler::<S, N>))
        .route("/api/search/:class_name", get(search_handler::<S, N>))
        .route("/api/tracked", post(track_handler::<S, N>))
        .route(
            "/api/tracked/:class_number",
            delete(untrack_handler::<S, N>),
        )
        .with_state(service)
}

pub(crate) async fn state_handler<S, N>(State(service): State<Arc<SeatMonitor<S, N>>>) -> Response
where
    S: SnapshotSource + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    (StatusCode::OK, axum::Json(service.state_view())).into_response()
}

pub(crate) async fn settings_handler<S, N>(
    State(service): State<Arc<SeatMonitor<S, N>>>,
    axum::Json(update): axum::Json<SettingsUpdate>,
) -> Response
where
    S: SnapshotSource + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    let outcome = service.update_settings(update);
    (StatusCode::OK, axum::Json(outcome)).into_response()
}

pub(crate) async fn search_handler<S, N>(
    State(service): State<Arc<SeatMonitor<S, N>>>,
    Path(class_name): Path<String>,
) -> Response
where
    S: SnapshotSource + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    match service.search(&ClassName(class_name)).await {
        Ok(sections) => (StatusCode::OK, axum::Json(sections)).into_response(),
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn track_handler<S, N>(
    State(service): State<Arc<SeatMonitor<S, N>>>,
    payload: Result<axum::Json<SectionSnapshot>, JsonRejection>,
) -> Response
where
    S: SnapshotSource + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    let snapshot = match payload {
        Ok(axum::Json(snapshot)) => snapshot,
        Err(rejection) => {
            let payload = json!({
                "error": format!("invalid section payload: {}", rejection.body_text()),
            });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    match service.track(snapshot).await {
        Ok(tracked) => (StatusCode::CREATED, axum::Json(tracked)).into_response(),
        Err(MonitorError::Registry(RegistryError::InvalidEntity)) => {
            let payload = json!({
                "error": RegistryError::InvalidEntity.to_string(),
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn untrack_handler<S, N>(
    State(service): State<Arc<SeatMonitor<S, N>>>,
    Path(class_number): Path<String>,
) -> Response
where
    S: SnapshotSource + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    let tracked = service.untrack(&ClassNumber(class_number));
    (StatusCode::OK, axum::Json(tracked)).into_response()
}
