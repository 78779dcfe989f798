use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryMatchStore};
use crate::routes::with_reconciliation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use estate_recon::config::AppConfig;
use estate_recon::error::AppError;
use estate_recon::telemetry;
use estate_recon::workflows::reconcile::{ReconcileServiceError, ReconciliationService};
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = match &config.reconcile.snapshot_path {
        Some(path) => InMemoryMatchStore::with_snapshot(path)?,
        None => InMemoryMatchStore::default(),
    };
    let service = ReconciliationService::new(Arc::new(store), &config.reconcile)
        .map_err(ReconcileServiceError::from)?;

    let app = with_reconciliation_routes(Arc::new(service))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        accept_threshold = config.reconcile.accept_threshold,
        volume_mode = ?config.reconcile.volume_mode,
        "estate reconciliation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
