//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use ripple_core::{AuthResolver, EvidenceService, ReportLifecycleService, ReportQueryService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthResolver,
    pub lifecycle: ReportLifecycleService,
    pub queries: ReportQueryService,
    pub evidence: EvidenceService,
}

/// Raw bearer token of the current request.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Extract the bearer token from the `Authorization` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}

/// Authentication middleware.
///
/// Attaches the token and, when it resolves, the [`ripple_core::Session`].
/// Route extractors decide whether a missing session is an error.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(req.headers()) {
        match state.auth.session(&token).await {
            Ok(session) => {
                req.extensions_mut().insert(session);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Bearer token did not resolve");
            }
        }
        req.extensions_mut().insert(BearerToken(token));
    }

    next.run(req).await
}
