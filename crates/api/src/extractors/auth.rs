use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use pos_db::models::User;
use pos_services::{auth::Claims, policy::Actor};

use crate::{error::ApiError, state::AppState};

/// The caller behind a valid access token (Authorization header or cookie),
/// re-read from the database so role and tenant are current.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub actor: Actor,
    pub user: User,
    pub claims: Claims,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;
        authenticate(&app_state, &token).await
    }
}

/// Like [`AuthUser`] but lets anonymous requests through. A token that is
/// present must still be valid.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        match bearer_token(parts) {
            Some(token) => Ok(MaybeAuthUser(Some(authenticate(&app_state, &token).await?))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}

async fn authenticate(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
    let claims = state.auth.verify_access_token(token)?;
    let (actor, user) = state.accounts.resolve_actor(&claims).await?;
    Ok(AuthUser {
        actor,
        user,
        claims,
    })
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .or_else(|| {
            parts
                .headers
                .get(header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|cookies| {
                    cookies.split(';').find_map(|cookie| {
                        cookie
                            .trim()
                            .strip_prefix("access_token=")
                            .map(|s| s.to_string())
                    })
                })
        })
        .filter(|token| !token.is_empty())
}
