use std::sync::Arc;

use bson::oid::ObjectId;
use mongodb::Database;
use pos_config::TenancySettings;
use pos_db::models::{normalize_email, Branch, Role, Tenant, TenantMailSettings, User};
use tracing::info;

use crate::auth::{AccessToken, AuthError, AuthService, Claims, TokenPair};
use crate::dao::base::{DaoError, PaginatedResult, PaginationParams};
use crate::dao::branch::BranchDao;
use crate::dao::tenant::TenantDao;
use crate::dao::user::{NewUser, UserDao, UserFilter, UserPatch};
use crate::error::{ServiceError, ServiceResult};
use crate::policy::{self, Actor, TenantBinding};

const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<Role>,
}

#[derive(Debug, Clone)]
pub struct NewTenant {
    pub name: String,
    pub domain: String,
    pub currency: Option<String>,
    pub mail: TenantMailSettings,
}

#[derive(Debug)]
pub enum SuperuserBootstrap {
    Created(User),
    AlreadyPresent,
    /// A regular tenant-less account owns the email; it is left untouched.
    EmailHeldByRegularUser,
}

/// Tenants, users and branches: everything account-shaped except invitations.
pub struct AccountService {
    users: UserDao,
    tenants: TenantDao,
    branches: BranchDao,
    auth: Arc<AuthService>,
    tenancy: TenancySettings,
}

impl AccountService {
    pub fn new(db: &Database, auth: Arc<AuthService>, tenancy: TenancySettings) -> Self {
        Self {
            users: UserDao::new(db),
            tenants: TenantDao::new(db),
            branches: BranchDao::new(db),
            auth,
            tenancy,
        }
    }

    pub async fn register(&self, caller: Option<&Actor>, reg: Registration) -> ServiceResult<User> {
        let (tenant_id, role) = policy::registration(caller, reg.role)?;
        let email = normalize_email(&reg.email);

        if self.users.email_taken(&email, tenant_id).await? {
            return Err(duplicate_email());
        }

        let password_hash = self.auth.hash_password(&reg.password)?;
        let user = self
            .users
            .create(NewUser {
                email,
                first_name: reg.first_name,
                last_name: reg.last_name,
                password_hash,
                role,
                tenant_id,
                branch_id: None,
                is_superuser: false,
            })
            .await
            .map_err(|e| match e {
                DaoError::DuplicateKey(_) => duplicate_email(),
                other => other.into(),
            })?;

        info!(user_id = ?user.id, tenant_id = ?tenant_id, %role, "User registered");
        Ok(user)
    }

    /// `domain` narrows the lookup to one tenant. An unknown domain fails like a wrong password.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        domain: Option<&str>,
    ) -> ServiceResult<(User, TokenPair)> {
        let email = normalize_email(email);
        let tenant_id = match domain {
            Some(domain) => match self.tenants.find_by_domain(&domain.trim().to_lowercase()).await {
                Ok(tenant) => tenant.id,
                Err(DaoError::NotFound) => return Err(AuthError::InvalidCredentials.into()),
                Err(e) => return Err(e.into()),
            },
            None => None,
        };

        let candidates = self.users.find_login_candidates(&email, tenant_id).await?;
        let user = self.auth.authenticate(&candidates, password)?.clone();
        let tokens = self.auth.generate_tokens(&user)?;

        if let Some(user_id) = user.id {
            self.users.touch_login(user_id).await?;
        }
        info!(user_id = ?user.id, "User logged in");
        Ok((user, tokens))
    }

    /// The new access token reflects the user as stored now, not as encoded in the refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<AccessToken> {
        let claims = self.auth.verify_refresh_token(refresh_token)?;
        let (_, user) = self.resolve_actor(&claims).await?;
        Ok(self.auth.generate_access_token(&user)?)
    }

    pub async fn resolve_actor(&self, claims: &Claims) -> ServiceResult<(Actor, User)> {
        let user_id = claims.user_id()?;
        let user = match self.users.base.find_by_id(user_id).await {
            Ok(user) => user,
            Err(DaoError::NotFound) => {
                return Err(AuthError::InvalidToken("User no longer exists".to_string()).into());
            }
            Err(e) => return Err(e.into()),
        };
        if !user.can_login() {
            return Err(AuthError::InvalidToken("Account is disabled".to_string()).into());
        }
        Ok((Actor::new(user_id, &user), user))
    }

    pub async fn create_tenant(&self, actor: &Actor, new_tenant: NewTenant) -> ServiceResult<Tenant> {
        let binding = policy::tenant_binding(actor, self.tenancy.allow_rebind_on_create)?;
        let domain = new_tenant.domain.trim().to_lowercase();

        if self.tenants.domain_taken(&domain).await? {
            return Err(ServiceError::Conflict(format!(
                "Domain '{domain}' is already taken"
            )));
        }

        let currency = new_tenant
            .currency
            .map(|c| c.trim().to_uppercase())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        let tenant = self
            .tenants
            .create(new_tenant.name, domain, currency, new_tenant.mail)
            .await?;
        let tenant_id = tenant.id.ok_or(ServiceError::NotFound)?;

        if binding == TenantBinding::Bind {
            self.users.bind_tenant(actor.user_id, tenant_id).await?;
        }

        info!(%tenant_id, domain = %tenant.domain, created_by = %actor.user_id, ?binding, "Tenant created");
        Ok(tenant)
    }

    pub async fn list_tenants(
        &self,
        actor: &Actor,
        params: &PaginationParams,
    ) -> ServiceResult<PaginatedResult<Tenant>> {
        Ok(self.tenants.list(&policy::tenant_scope(actor), params).await?)
    }

    pub async fn list_users(
        &self,
        actor: &Actor,
        filter: &UserFilter,
        params: &PaginationParams,
    ) -> ServiceResult<PaginatedResult<User>> {
        Ok(self.users.list(&policy::user_scope(actor), filter, params).await?)
    }

    pub async fn get_user(&self, actor: &Actor, id: ObjectId) -> ServiceResult<User> {
        Ok(self.users.find_in_scope(&policy::user_scope(actor), id).await?)
    }

    pub async fn update_user(&self, actor: &Actor, id: ObjectId, patch: UserPatch) -> ServiceResult<User> {
        if patch.is_empty() {
            return Err(ServiceError::Validation("Nothing to update".to_string()));
        }

        let target = self.live_user_in_scope(actor, id).await?;
        policy::authorize_user_update(actor, &target, patch.is_privileged(), patch.role)?;

        if let Some(branch_id) = patch.branch_id {
            let tenant_id = target.tenant_id.ok_or_else(|| {
                ServiceError::Validation("A user without a tenant cannot have a branch".to_string())
            })?;
            self.branches.find_in_tenant(tenant_id, branch_id).await?;
        }

        let updated = self.users.apply_patch(id, &patch).await?;
        info!(user_id = %id, updated_by = %actor.user_id, "User updated");
        Ok(updated)
    }

    pub async fn delete_user(&self, actor: &Actor, id: ObjectId) -> ServiceResult<()> {
        let target = self.live_user_in_scope(actor, id).await?;
        policy::authorize_user_delete(actor, &target)?;
        self.users.soft_delete(id).await?;
        info!(user_id = %id, deleted_by = %actor.user_id, "User soft-deleted");
        Ok(())
    }

    pub async fn create_branch(&self, actor: &Actor, name: String) -> ServiceResult<Branch> {
        let tenant_id = policy::authorize_branch_create(actor)?;
        let branch = self.branches.create(tenant_id, name).await?;
        info!(branch_id = ?branch.id, %tenant_id, "Branch created");
        Ok(branch)
    }

    pub async fn list_branches(&self, actor: &Actor) -> ServiceResult<Vec<Branch>> {
        Ok(self.branches.list(&policy::tenant_scope(actor)).await?)
    }

    /// Creates a tenant-less superuser unless an account with that email already exists there.
    pub async fn ensure_superuser(
        &self,
        email: &str,
        password: &str,
    ) -> ServiceResult<SuperuserBootstrap> {
        let email = normalize_email(email);
        if let Some(existing) = self.users.find_tenantless(&email).await? {
            return Ok(if existing.is_superuser {
                SuperuserBootstrap::AlreadyPresent
            } else {
                SuperuserBootstrap::EmailHeldByRegularUser
            });
        }

        let password_hash = self.auth.hash_password(password)?;
        let user = self
            .users
            .create(NewUser {
                email,
                first_name: "Super".to_string(),
                last_name: "User".to_string(),
                password_hash,
                role: Role::Owner,
                tenant_id: None,
                branch_id: None,
                is_superuser: true,
            })
            .await?;
        info!(user_id = ?user.id, email = %user.email, "Superuser created");
        Ok(SuperuserBootstrap::Created(user))
    }

    async fn live_user_in_scope(&self, actor: &Actor, id: ObjectId) -> ServiceResult<User> {
        let user = self.users.find_in_scope(&policy::user_scope(actor), id).await?;
        if user.is_deleted {
            return Err(ServiceError::NotFound);
        }
        Ok(user)
    }
}

fn duplicate_email() -> ServiceError {
    ServiceError::Conflict("A user with this email already exists".to_string())
}
