//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use ripple_common::AppError;
use ripple_core::{Role, Session};

use crate::middleware::BearerToken;

fn session(parts: &Parts) -> Result<Session, AppError> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or(AppError::Unauthenticated)
}

fn session_with_role(parts: &Parts, required: Role) -> Result<Session, AppError> {
    let session = session(parts)?;
    let role = session.require_role()?;
    if role == required {
        Ok(session)
    } else {
        Err(AppError::Forbidden(format!(
            "This console is for {required:?} accounts; yours is at {}",
            role.home()
        )))
    }
}

/// Any signed-in user, with or without a role.
#[derive(Debug, Clone)]
pub struct AuthSession(pub Session);

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session(parts).map(Self)
    }
}

/// A signed-in user holding any staff role.
#[derive(Debug, Clone)]
pub struct StaffUser(pub Session);

impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session(parts)?;
        session.require_role()?;
        Ok(Self(session))
    }
}

/// A signed-in admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Session);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_with_role(parts, Role::Admin).map(Self)
    }
}

/// A signed-in supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorUser(pub Session);

impl<S> FromRequestParts<S> for SupervisorUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_with_role(parts, Role::Supervisor).map(Self)
    }
}

/// The raw bearer token, required.
#[derive(Debug, Clone)]
pub struct Token(pub String);

impl<S> FromRequestParts<S> for Token
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<BearerToken>()
            .map(|t| Self(t.0.clone()))
            .ok_or(AppError::Unauthenticated)
    }
}
