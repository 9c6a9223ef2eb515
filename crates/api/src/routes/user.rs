use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use pos_db::models::{Role, User};
use pos_services::dao::base::{PaginatedResult, PaginationParams};
use pos_services::dao::user::{UserFilter, UserPatch};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{hex, parse_id, parse_optional_id, timestamp};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub tenant: Option<String>,
    pub branch: Option<String>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub is_superuser: bool,
    pub last_login_at: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: hex(user.id),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            tenant: user.tenant_id.map(|t| t.to_hex()),
            branch: user.branch_id.map(|b| b.to_hex()),
            is_active: user.is_active,
            is_deleted: user.is_deleted,
            is_superuser: user.is_superuser,
            last_login_at: user.last_login_at.map(timestamp),
            created_at: timestamp(user.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "first_page")]
    pub page: u64,
    #[serde(default = "page_size")]
    pub per_page: u64,
    pub role: Option<Role>,
    pub tenant: Option<String>,
    pub branch: Option<String>,
}

fn first_page() -> u64 {
    PaginationParams::default().page
}

fn page_size() -> u64 {
    PaginationParams::default().per_page
}

/// Partial update. The tenant reference is deliberately absent: unknown
/// fields are rejected, so it cannot be changed through this endpoint.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 150))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 150))]
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub branch: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<PaginatedResult<UserResponse>>, ApiError> {
    let filter = UserFilter {
        role: query.role,
        tenant_id: parse_optional_id(query.tenant.as_deref(), "tenant")?,
        branch_id: parse_optional_id(query.branch.as_deref(), "branch")?,
    };
    let params = PaginationParams {
        page: query.page,
        per_page: query.per_page,
    };

    let users = state
        .accounts
        .list_users(&auth.actor, &filter, &params)
        .await?;
    Ok(Json(users.map(UserResponse::from)))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&user_id, "user id")?;
    let user = state.accounts.get_user(&auth.actor, id).await?;
    Ok(Json(user.into()))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    body.validate()?;
    let id = parse_id(&user_id, "user id")?;

    let patch = UserPatch {
        first_name: body.first_name,
        last_name: body.last_name,
        role: body.role,
        branch_id: parse_optional_id(body.branch.as_deref(), "branch")?,
        is_active: body.is_active,
    };
    let user = state.accounts.update_user(&auth.actor, id, patch).await?;
    Ok(Json(user.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&user_id, "user id")?;
    state.accounts.delete_user(&auth.actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
