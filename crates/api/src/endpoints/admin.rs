//! Admin console endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use ripple_common::AppResult;
use ripple_core::{Dashboard, ReportFilter, Session, StatusUpdate};
use ripple_db::{entities::report::ReportStatus, repositories::ReportScope};
use serde::Deserialize;
use validator::Validate;

use super::{ReportQuery, present};
use crate::{extractors::AdminUser, middleware::AppState, response::ReportResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/reports", get(list_reports))
        .route("/report/{id}/start", patch(start_work))
        .route("/report/{id}/status", patch(update_status))
        .route("/report/{id}/resolve", patch(resolve))
}

#[derive(Debug, Deserialize, Validate)]
pub struct StartWorkRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub estimated_time: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusRequest {
    pub status: ReportStatus,
    #[validate(url)]
    pub photo_url: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub estimated_time: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResolveRequest {
    #[serde(default)]
    #[validate(url)]
    pub image_url: String,
    #[validate(length(max = 64))]
    pub resolved_class: Option<String>,
}

async fn me(AdminUser(session): AdminUser) -> AppResult<Json<Session>> {
    Ok(Json(session))
}

async fn list_reports(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Vec<ReportResponse>>> {
    let owner = present(query.user_id.clone());
    let filter = ReportFilter::try_from(query)?;
    let reports = match owner {
        Some(user_id) => filter.apply(
            state
                .queries
                .list_reports(&ReportScope::OwnedBy(user_id))
                .await?,
        ),
        None => state.queries.dashboard(Dashboard::Admin, &filter).await?,
    };

    Ok(Json(reports.into_iter().map(Into::into).collect()))
}

async fn start_work(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<StartWorkRequest>,
) -> AppResult<Json<ReportResponse>> {
    req.validate()?;

    let report = state
        .lifecycle
        .start_work(&admin, &id, &req.estimated_time)
        .await?;

    Ok(Json(report.into()))
}

async fn update_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> AppResult<Json<ReportResponse>> {
    req.validate()?;

    let update = StatusUpdate {
        status: req.status,
        photo_url: req.photo_url,
        estimated_time: req.estimated_time,
    };
    let report = state.lifecycle.update_status(&admin, &id, &update).await?;

    Ok(Json(report.into()))
}

async fn resolve(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<ResolveRequest>,
) -> AppResult<Json<ReportResponse>> {
    req.validate()?;

    let report = state
        .lifecycle
        .resolve_manual(&admin, &id, &req.image_url, req.resolved_class)
        .await?;

    Ok(Json(report.into()))
}
