//! Supervisor console endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use ripple_common::AppResult;
use ripple_core::{Dashboard, ReportFilter, Session};
use serde::Deserialize;
use validator::Validate;

use super::ReportQuery;
use crate::{
    extractors::SupervisorUser,
    middleware::AppState,
    response::{CompleteResponse, ReportResponse},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/reports", get(list_reports))
        .route("/report/{id}/assign-worker", patch(assign_worker))
        .route("/report/{id}/complete", patch(complete))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignWorkerRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub worker_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteRequest {
    #[serde(default)]
    #[validate(url)]
    pub image_url: String,
}

async fn me(SupervisorUser(session): SupervisorUser) -> AppResult<Json<Session>> {
    Ok(Json(session))
}

/// Unresolved reports.
async fn list_reports(
    State(state): State<AppState>,
    SupervisorUser(_supervisor): SupervisorUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Vec<ReportResponse>>> {
    let filter = ReportFilter::try_from(query)?;
    let reports = state
        .queries
        .dashboard(Dashboard::Supervisor, &filter)
        .await?;

    Ok(Json(reports.into_iter().map(Into::into).collect()))
}

async fn assign_worker(
    State(state): State<AppState>,
    SupervisorUser(supervisor): SupervisorUser,
    Path(id): Path<String>,
    Json(req): Json<AssignWorkerRequest>,
) -> AppResult<Json<ReportResponse>> {
    req.validate()?;

    let report = state
        .lifecycle
        .assign_worker(&supervisor, &id, &req.worker_name)
        .await?;

    Ok(Json(report.into()))
}

async fn complete(
    State(state): State<AppState>,
    SupervisorUser(supervisor): SupervisorUser,
    Path(id): Path<String>,
    Json(req): Json<CompleteRequest>,
) -> AppResult<Json<CompleteResponse>> {
    req.validate()?;

    let outcome = state
        .lifecycle
        .complete(&supervisor, &id, &req.image_url)
        .await?;

    Ok(Json(outcome.into()))
}
