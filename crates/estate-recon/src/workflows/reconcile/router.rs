use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::service::{MatchRequest, MatchResponse, ReconcileServiceError, ReconciliationService};
use super::store::MatchStore;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub gazette_text: String,
}

/// Router builder exposing the match, listing, clearing, and bulk extraction endpoints.
pub fn reconciliation_router<S>(service: Arc<ReconciliationService<S>>) -> Router
where
    S: MatchStore + 'static,
{
    Router::new()
        .route("/api/v1/gazette/match", post(match_handler::<S>))
        .route("/api/v1/gazette/matches", get(list_handler::<S>))
        .route("/api/v1/gazette/clear-records", post(clear_handler::<S>))
        .route("/api/v1/bulk/extract", post(extract_handler::<S>))
        .with_state(service)
}

pub(crate) async fn match_handler<S>(
    State(service): State<Arc<ReconciliationService<S>>>,
    Json(request): Json<MatchRequest>,
) -> Response
where
    S: MatchStore + 'static,
{
    match run_within_budget(service, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}

/// The budget covers extraction and matching. Persistence starts only once
/// that step has finished in time, so a timed-out run never writes.
async fn run_within_budget<S>(
    service: Arc<ReconciliationService<S>>,
    request: MatchRequest,
) -> Result<MatchResponse, ReconcileServiceError>
where
    S: MatchStore + 'static,
{
    let budget = service.run_timeout();
    let today = Local::now().date_naive();

    let worker = {
        let service = Arc::clone(&service);
        tokio::task::spawn_blocking(move || service.reconcile(request, today))
    };
    let report = match tokio::time::timeout(budget, worker).await {
        Ok(joined) => joined.map_err(|err| ReconcileServiceError::Worker(err.to_string()))??,
        Err(_) => {
            tracing::warn!(?budget, "reconciliation run timed out before persisting");
            return Err(ReconcileServiceError::TimedOut(budget));
        }
    };

    tokio::task::spawn_blocking(move || service.persist(report))
        .await
        .map_err(|err| ReconcileServiceError::Worker(err.to_string()))
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<ReconciliationService<S>>>,
) -> Response
where
    S: MatchStore + 'static,
{
    match service.matches() {
        Ok(rows) => {
            let payload = json!({
                "count": rows.len(),
                "rows": rows,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => AppError::from(error).into_response(),
    }
}

pub(crate) async fn clear_handler<S>(
    State(service): State<Arc<ReconciliationService<S>>>,
) -> Response
where
    S: MatchStore + 'static,
{
    match service.clear() {
        Ok(deleted) => (StatusCode::OK, Json(json!({ "deleted": deleted }))).into_response(),
        Err(error) => AppError::from(error).into_response(),
    }
}

pub(crate) async fn extract_handler<S>(
    State(service): State<Arc<ReconciliationService<S>>>,
    Json(request): Json<ExtractRequest>,
) -> Response
where
    S: MatchStore + 'static,
{
    let extraction = service.extract(&request.gazette_text);
    (StatusCode::OK, Json(extraction)).into_response()
}
