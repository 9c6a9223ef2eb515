use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use pos_db::models::{Invitation, InvitationStatus, Role};
use pos_services::dao::base::{PaginatedResult, PaginationParams};
use pos_services::invitation::{IssueInvitation, RedeemInvitation};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{hex, parse_id, parse_optional_id, timestamp};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    pub role: Role,
    pub branch: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AcceptInvitationRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150))]
    pub last_name: String,
}

/// The token is never echoed back; it only travels in the invitation email.
#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub id: String,
    pub email: String,
    pub tenant: String,
    pub role: Role,
    pub branch: Option<String>,
    pub invited_by: String,
    pub status: InvitationStatus,
    pub expires_at: String,
    pub accepted_at: Option<String>,
    pub created_at: String,
}

impl From<Invitation> for InvitationResponse {
    fn from(invitation: Invitation) -> Self {
        Self {
            status: invitation.status(),
            id: hex(invitation.id),
            email: invitation.email,
            tenant: invitation.tenant_id.to_hex(),
            role: invitation.role,
            branch: invitation.branch_id.map(|b| b.to_hex()),
            invited_by: invitation.invited_by.to_hex(),
            expires_at: timestamp(invitation.expires_at),
            accepted_at: invitation.accepted_at.map(timestamp),
            created_at: timestamp(invitation.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvitationSentResponse {
    pub message: String,
    pub invitation: InvitationResponse,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub message: String,
    pub user_id: String,
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<InvitationSentResponse>), ApiError> {
    body.validate()?;

    let invitation = state
        .invitations
        .issue(
            &auth.actor,
            IssueInvitation {
                email: body.email,
                role: body.role,
                branch_id: parse_optional_id(body.branch.as_deref(), "branch")?,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(InvitationSentResponse {
            message: "Invitation sent successfully.".to_string(),
            invitation: invitation.into(),
        }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResult<InvitationResponse>>, ApiError> {
    let invitations = state.invitations.list(&auth.actor, &params).await?;
    Ok(Json(invitations.map(InvitationResponse::from)))
}

pub async fn resend(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(invitation_id): Path<String>,
) -> Result<Json<InvitationSentResponse>, ApiError> {
    let id = parse_id(&invitation_id, "invitation id")?;
    let invitation = state.invitations.resend(&auth.actor, id).await?;

    Ok(Json(InvitationSentResponse {
        message: "Invitation sent successfully.".to_string(),
        invitation: invitation.into(),
    }))
}

pub async fn accept(
    State(state): State<AppState>,
    Json(body): Json<AcceptInvitationRequest>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    body.validate()?;

    let user = state
        .invitations
        .redeem(RedeemInvitation {
            token: body.token,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AcceptedResponse {
            message: "Account created successfully. You can now log in.".to_string(),
            user_id: hex(user.id),
        }),
    ))
}
