use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
};
use pos_db::models::Role;
use pos_services::accounts::Registration;
use pos_services::auth::{AccessToken, TokenPair};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::UserResponse;
use crate::{
    error::ApiError,
    extractors::auth::{AuthUser, MaybeAuthUser},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub first_name: String,
    #[validate(length(max = 150))]
    #[serde(default)]
    pub last_name: String,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    /// Tenant domain, needed only when the email exists in several tenants.
    pub domain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub tenant: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    body.validate()?;

    let user = state
        .accounts
        .register(
            caller.as_ref().map(|c| &c.actor),
            Registration {
                email: body.email,
                password: body.password,
                first_name: body.first_name,
                last_name: body.last_name,
                role: body.role,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user_id: super::hex(user.id),
            email: user.email,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    body.validate()?;

    let (user, tokens) = state
        .accounts
        .login(&body.email, &body.password, body.domain.as_deref())
        .await?;

    let headers = access_cookie(&tokens)?;
    Ok((
        headers,
        Json(AuthResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            user: user.into(),
        }),
    ))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<AccessToken>, ApiError> {
    let token = state.accounts.refresh(&body.refresh_token).await?;
    Ok(Json(token))
}

pub async fn profile(auth: AuthUser) -> Json<ProfileResponse> {
    let user = auth.user;
    Json(ProfileResponse {
        id: super::hex(user.id),
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        role: user.role,
        tenant: user.tenant_id.map(|t| t.to_hex()),
    })
}

fn access_cookie(tokens: &TokenPair) -> Result<HeaderMap, ApiError> {
    let cookie = format!(
        "access_token={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        tokens.access_token, tokens.expires_in
    );
    let value = HeaderValue::from_str(&cookie)
        .map_err(|_| ApiError::Internal("Invalid cookie value".to_string()))?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}
