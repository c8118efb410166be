//! Session endpoints.

use axum::{Json, Router, extract::State, routing::{get, post}};
use ripple_common::AppResult;
use ripple_core::Session;

use crate::{
    extractors::{AuthSession, Token},
    middleware::AppState,
    response::OkResponse,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/signout", post(signout))
}

/// The signed-in user. `role` is null when no role record matched.
async fn me(AuthSession(session): AuthSession) -> AppResult<Json<Session>> {
    Ok(Json(session))
}

async fn signout(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Token(token): Token,
) -> AppResult<Json<OkResponse>> {
    state.auth.sign_out(&token).await?;
    tracing::info!(user_id = %session.id, "Session signed out");
    Ok(Json(OkResponse::new()))
}
