use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use pos_db::models::{Tenant, TenantMailSettings};
use pos_services::accounts::NewTenant;
use pos_services::dao::base::{PaginatedResult, PaginationParams};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{hex, timestamp};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTenantRequest {
    #[validate(length(min = 1, max = 100, message = "Name must not be empty"))]
    pub name: String,
    #[validate(custom(function = "validate_domain"))]
    pub domain: String,
    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: Option<String>,
    pub mail: Option<TenantMailRequest>,
}

/// Outbound email account for the tenant. Omitted fields fall back to the global relay.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TenantMailRequest {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub use_tls: Option<bool>,
    pub use_ssl: Option<bool>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[validate(email)]
    pub from_address: Option<String>,
    pub from_name: Option<String>,
}

impl From<TenantMailRequest> for TenantMailSettings {
    fn from(req: TenantMailRequest) -> Self {
        let defaults = TenantMailSettings::default();
        Self {
            host: req.host,
            port: req.port,
            use_tls: req.use_tls.unwrap_or(defaults.use_tls),
            use_ssl: req.use_ssl.unwrap_or(defaults.use_ssl),
            username: req.username,
            password: req.password,
            from_address: req.from_address,
            from_name: req.from_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TenantResponse {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub currency: String,
    pub is_active: bool,
    pub mail_configured: bool,
    pub created_at: String,
}

impl From<Tenant> for TenantResponse {
    fn from(tenant: Tenant) -> Self {
        Self {
            id: hex(tenant.id),
            mail_configured: tenant.mail.is_configured(),
            name: tenant.name,
            domain: tenant.domain,
            currency: tenant.currency,
            is_active: tenant.is_active,
            created_at: timestamp(tenant.created_at),
        }
    }
}

fn validate_domain(domain: &str) -> Result<(), ValidationError> {
    let domain = domain.trim();
    let well_formed = (3..=253).contains(&domain.len())
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("domain").with_message("Enter a valid domain".into()))
    }
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateTenantRequest>,
) -> Result<(StatusCode, Json<TenantResponse>), ApiError> {
    body.validate()?;
    let mail = match body.mail {
        Some(mail) => {
            mail.validate()?;
            mail.into()
        }
        None => TenantMailSettings::default(),
    };

    let tenant = state
        .accounts
        .create_tenant(
            &auth.actor,
            NewTenant {
                name: body.name,
                domain: body.domain,
                currency: body.currency,
                mail,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(tenant.into())))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResult<TenantResponse>>, ApiError> {
    let tenants = state.accounts.list_tenants(&auth.actor, &params).await?;
    Ok(Json(tenants.map(TenantResponse::from)))
}
