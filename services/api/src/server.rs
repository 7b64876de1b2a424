use crate::cli::{SearchArgs, ServeArgs};
use crate::infra::{live_monitor, snapshot_source, AppState};
use crate::routes::with_monitor_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use seatwatch::config::AppConfig;
use seatwatch::error::AppError;
use seatwatch::monitoring::{ClassName, SnapshotSource};
use seatwatch::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let monitor = Arc::new(live_monitor(&config.monitor)?);
    let scheduler = monitor.start_scheduler();

    let app = with_monitor_routes(monitor)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        term = %config.monitor.term,
        "seat monitor ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    readiness_flag.store(false, Ordering::Release);
    scheduler.shutdown().await;
    Ok(())
}

pub(crate) async fn search(args: SearchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, config.environment)?;

    let term = args.term.unwrap_or_else(|| config.monitor.term.clone());
    let source = snapshot_source(&config.monitor)?;
    let class_name = ClassName::new(args.class_name);
    let sections = source.fetch(&class_name, &term).await?;

    if sections.is_empty() {
        println!("No sections found for {class_name} in term {term}.");
        return Ok(());
    }

    println!("{class_name} ({} sections, term {term})", sections.len());
    for section in sections {
        println!(
            "  {:<8} {:<9} {:<12} {} / {}",
            section.class_number.as_str(),
            section.status.label(),
            section.seats,
            section.title,
            section.instructor
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
