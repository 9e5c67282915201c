use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use super::repo_types::User;
use crate::{error::AppError, state::AppState};

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Resolves the acting user from the request headers.
///
/// Every failure (no header, bad or expired token, unknown subject, inactive
/// user) is reported as [`AppError::Unauthenticated`]; storage failures stay
/// [`AppError::Unexpected`].
pub async fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<User, AppError> {
    let Some(token) = bearer_token(headers) else {
        debug!("no bearer token");
        return Err(AppError::Unauthenticated);
    };

    let claims = state.jwt.verify(token).map_err(|e| {
        debug!(reason = %e, "token rejected");
        AppError::Unauthenticated
    })?;

    let Some(user) = state.users.find_by_id(claims.sub).await? else {
        debug!(user_id = %claims.sub, "token subject not found");
        return Err(AppError::Unauthenticated);
    };

    if !user.is_active {
        debug!(user_id = %user.id, "token subject inactive");
        return Err(AppError::Unauthenticated);
    }

    Ok(user)
}

/// Required authentication: rejects the request with 401 on any failure.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, state).await.map(AuthUser)
    }
}

/// Optional authentication: a missing or rejected credential means anonymous.
#[derive(Debug, Clone)]
pub enum Caller {
    Authenticated(User),
    Anonymous,
}

impl Caller {
    pub fn user(&self) -> Option<&User> {
        match self {
            Caller::Authenticated(u) => Some(u),
            Caller::Anonymous => None,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(&parts.headers, state).await {
            Ok(user) => Ok(Caller::Authenticated(user)),
            Err(AppError::Unauthenticated) => Ok(Caller::Anonymous),
            Err(e) => Err(e),
        }
    }
}
