use axum::{Json, extract::State, http::StatusCode};
use pos_db::models::Branch;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{hex, timestamp};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBranchRequest {
    #[validate(length(min = 1, max = 100, message = "Name must not be empty"))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct BranchResponse {
    pub id: String,
    pub tenant: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: String,
}

impl From<Branch> for BranchResponse {
    fn from(branch: Branch) -> Self {
        Self {
            id: hex(branch.id),
            tenant: branch.tenant_id.to_hex(),
            name: branch.name,
            is_active: branch.is_active,
            created_at: timestamp(branch.created_at),
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateBranchRequest>,
) -> Result<(StatusCode, Json<BranchResponse>), ApiError> {
    body.validate()?;
    let branch = state
        .accounts
        .create_branch(&auth.actor, body.name.trim().to_string())
        .await?;
    Ok((StatusCode::CREATED, Json(branch.into())))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<BranchResponse>>, ApiError> {
    let branches = state.accounts.list_branches(&auth.actor).await?;
    Ok(Json(branches.into_iter().map(BranchResponse::from).collect()))
}
