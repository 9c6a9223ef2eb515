use std::sync::Arc;

use bson::{oid::ObjectId, DateTime};
use mongodb::Database;
use pos_config::{MailSettings, Settings};
use pos_db::models::{normalize_email, Invitation, Role, Tenant, User};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::AuthService;
use crate::background::MailDispatcher;
use crate::dao::base::{DaoError, PaginatedResult, PaginationParams};
use crate::dao::branch::BranchDao;
use crate::dao::invitation::InvitationDao;
use crate::dao::tenant::TenantDao;
use crate::dao::user::{NewUser, UserDao};
use crate::error::{ServiceError, ServiceResult};
use crate::mail::{templates::INVITATION, MailJob, TransportConfig};
use crate::policy::{self, Actor};

#[derive(Debug, Clone)]
pub struct IssueInvitation {
    pub email: String,
    pub role: Role,
    pub branch_id: Option<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct RedeemInvitation {
    pub token: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

pub struct InvitationService {
    invitations: InvitationDao,
    users: UserDao,
    tenants: TenantDao,
    branches: BranchDao,
    auth: Arc<AuthService>,
    dispatcher: Arc<dyn MailDispatcher>,
    mail: MailSettings,
    frontend_base_url: String,
    ttl: chrono::Duration,
}

impl InvitationService {
    pub fn new(
        db: &Database,
        auth: Arc<AuthService>,
        dispatcher: Arc<dyn MailDispatcher>,
        settings: &Settings,
    ) -> Self {
        Self {
            invitations: InvitationDao::new(db),
            users: UserDao::new(db),
            tenants: TenantDao::new(db),
            branches: BranchDao::new(db),
            auth,
            dispatcher,
            mail: settings.mail.clone(),
            frontend_base_url: settings.frontend.base_url.clone(),
            ttl: chrono::Duration::days(settings.invitation.ttl_days),
        }
    }

    /// Persists a pending invitation and queues its email.
    ///
    /// A refused submission surfaces as `Dependency`; the invitation is kept
    /// and can be sent again through [`InvitationService::resend`].
    pub async fn issue(&self, actor: &Actor, req: IssueInvitation) -> ServiceResult<Invitation> {
        let tenant_id = policy::authorize_invite(actor, req.role)?;

        if let Some(branch_id) = req.branch_id {
            self.branches.find_in_tenant(tenant_id, branch_id).await?;
        }

        let email = normalize_email(&req.email);
        // Removed members keep their row, so their email stays taken in this tenant.
        if self.users.email_taken(&email, Some(tenant_id)).await? {
            return Err(already_member());
        }

        let invitation = self
            .invitations
            .create(email, tenant_id, req.role, req.branch_id, actor.user_id, self.ttl)
            .await?;
        info!(
            invitation_id = ?invitation.id,
            %tenant_id,
            role = %invitation.role,
            invited_by = %actor.user_id,
            "Invitation created"
        );

        self.dispatch(&invitation).await?;
        Ok(invitation)
    }

    pub async fn redeem(&self, req: RedeemInvitation) -> ServiceResult<User> {
        let invitation = self.invitations.find_unaccepted_by_token(&req.token).await?;
        if invitation.is_expired_at(DateTime::now()) {
            return Err(ServiceError::Expired);
        }
        let invitation_id = invitation.id.ok_or(ServiceError::NotFound)?;

        let password_hash = self.auth.hash_password(&req.password)?;
        let user = NewUser {
            email: invitation.email.clone(),
            first_name: req.first_name,
            last_name: req.last_name,
            password_hash,
            role: invitation.role,
            tenant_id: Some(invitation.tenant_id),
            branch_id: invitation.branch_id,
            is_superuser: false,
        }
        .into_user();

        let user_id = self
            .invitations
            .accept(invitation_id, &user)
            .await
            .map_err(|e| match e {
                DaoError::DuplicateKey(_) => already_member(),
                other => other.into(),
            })?;

        info!(%invitation_id, %user_id, tenant_id = %invitation.tenant_id, "Invitation redeemed");
        Ok(self.users.base.find_by_id(user_id).await?)
    }

    pub async fn list(
        &self,
        actor: &Actor,
        params: &PaginationParams,
    ) -> ServiceResult<PaginatedResult<Invitation>> {
        let scope = policy::invitation_scope(actor)?;
        Ok(self.invitations.list(&scope, params).await?)
    }

    pub async fn resend(&self, actor: &Actor, id: ObjectId) -> ServiceResult<Invitation> {
        let scope = policy::invitation_scope(actor)?;
        let invitation = self.invitations.find_in_scope(&scope, id).await?;
        if invitation.is_accepted {
            return Err(ServiceError::NotFound);
        }
        if invitation.is_expired_at(DateTime::now()) {
            return Err(ServiceError::Expired);
        }

        self.dispatch(&invitation).await?;
        info!(invitation_id = %id, resent_by = %actor.user_id, "Invitation resent");
        Ok(invitation)
    }

    async fn dispatch(&self, invitation: &Invitation) -> ServiceResult<()> {
        let tenant = self.tenants.base.find_by_id(invitation.tenant_id).await?;
        let inviter = self.users.base.find_by_id(invitation.invited_by).await?;
        let job = invitation_job(
            invitation,
            &tenant,
            &inviter.full_name(),
            &self.frontend_base_url,
            &self.mail,
        );

        self.dispatcher.submit(job).map_err(|e| {
            warn!(invitation_id = ?invitation.id, error = %e, "Invitation email was not queued");
            ServiceError::from(e)
        })
    }
}

fn already_member() -> ServiceError {
    ServiceError::Conflict("A user with this email already belongs to this tenant".to_string())
}

pub fn invitation_link(base_url: &str, token: &str) -> String {
    format!("{}/accept-invitation/{}/", base_url.trim_end_matches('/'), token)
}

/// Builds the invitation email. The expiry is rendered from the stored value.
pub fn invitation_job(
    invitation: &Invitation,
    tenant: &Tenant,
    inviter_name: &str,
    base_url: &str,
    fallback: &MailSettings,
) -> MailJob {
    MailJob {
        transport: TransportConfig::for_tenant(tenant, fallback),
        subject: format!("Invitation to join {}", tenant.name),
        to: invitation.email.clone(),
        template: INVITATION.to_string(),
        context: json!({
            "tenant_name": tenant.name,
            "inviter_name": inviter_name,
            "role": invitation.role.as_str(),
            "invitation_url": invitation_link(base_url, &invitation.token),
            "expiry_date": invitation.expires_at.to_chrono().format("%B %d, %Y").to_string(),
        }),
    }
}
