//! Endpoints shared by both consoles.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{get, post},
};
use ripple_common::{AppError, AppResult};

use crate::{
    extractors::StaffUser,
    middleware::AppState,
    response::{ClassResponse, EvidenceResponse, HotspotResponse},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/hotspots", get(hotspots))
        .route("/reports/{id}/evidence", post(upload_evidence))
        .route("/classes/{label}", get(class_info))
}

/// Upload a resolution photo from the multipart field `file`.
async fn upload_evidence(
    State(state): State<AppState>,
    StaffUser(user): StaffUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<EvidenceResponse>> {
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file: {e}")))?;
        file = Some((name, content_type, data.to_vec()));
    }

    let (name, content_type, data) =
        file.ok_or_else(|| AppError::ValidationFailed("No file provided".to_string()))?;

    let uploaded = state
        .evidence
        .upload_evidence_photo(&id, &name, &content_type, &data)
        .await?;
    tracing::debug!(user_id = %user.id, report_id = %id, "Evidence stored");

    Ok(Json(EvidenceResponse {
        url: uploaded.url,
        key: uploaded.key,
        size: uploaded.size,
    }))
}

async fn hotspots(
    State(state): State<AppState>,
    StaffUser(_user): StaffUser,
) -> AppResult<Json<Vec<HotspotResponse>>> {
    let groups = state.queries.hotspots().await?;
    Ok(Json(groups.into_iter().map(Into::into).collect()))
}

async fn class_info(
    StaffUser(_user): StaffUser,
    Path(label): Path<String>,
) -> AppResult<Json<ClassResponse>> {
    Ok(Json(ClassResponse::for_label(&label)))
}
