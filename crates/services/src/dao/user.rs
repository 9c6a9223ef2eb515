use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::Database;
use pos_db::models::{Role, User};

use super::base::{BaseDao, DaoError, DaoResult, PaginatedResult, PaginationParams};
use crate::policy::UserScope;

pub struct UserDao {
    pub base: BaseDao<User>,
}

/// Fields of a user record about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
    pub tenant_id: Option<ObjectId>,
    pub branch_id: Option<ObjectId>,
    pub is_superuser: bool,
}

impl NewUser {
    pub fn into_user(self) -> User {
        let now = DateTime::now();
        User {
            id: None,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash: self.password_hash,
            role: self.role,
            tenant_id: self.tenant_id,
            branch_id: self.branch_id,
            is_active: true,
            is_deleted: false,
            is_superuser: self.is_superuser,
            last_login_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub branch_id: Option<ObjectId>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    pub fn is_privileged(&self) -> bool {
        self.role.is_some() || self.branch_id.is_some() || self.is_active.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && !self.is_privileged() && self.last_name.is_none()
    }

    fn to_set(&self) -> DaoResult<Document> {
        let mut set = Document::new();
        if let Some(ref first_name) = self.first_name {
            set.insert("first_name", first_name);
        }
        if let Some(ref last_name) = self.last_name {
            set.insert("last_name", last_name);
        }
        if let Some(role) = self.role {
            set.insert("role", bson::to_bson(&role)?);
        }
        if let Some(branch_id) = self.branch_id {
            set.insert("branch_id", branch_id);
        }
        if let Some(is_active) = self.is_active {
            set.insert("is_active", is_active);
        }
        Ok(set)
    }
}

/// Optional listing filters. The caller's scope is applied on top and always wins.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub tenant_id: Option<ObjectId>,
    pub branch_id: Option<ObjectId>,
}

pub fn scope_filter(scope: &UserScope) -> Document {
    match scope {
        UserScope::All => Document::new(),
        UserScope::Tenant(tenant_id) => doc! { "tenant_id": tenant_id },
        UserScope::OnlySelf(user_id) => doc! { "_id": user_id },
    }
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(&self, new_user: NewUser) -> DaoResult<User> {
        let user = new_user.into_user();
        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_tenantless(&self, email: &str) -> DaoResult<Option<User>> {
        self.base
            .find_one(doc! { "email": email, "tenant_id": null })
            .await
    }

    /// Uniqueness is enforced over every record, soft-deleted ones included.
    pub async fn email_taken(&self, email: &str, tenant_id: Option<ObjectId>) -> DaoResult<bool> {
        let count = self
            .base
            .count(doc! { "email": email, "tenant_id": tenant_id })
            .await?;
        Ok(count > 0)
    }

    pub async fn find_login_candidates(
        &self,
        email: &str,
        tenant_id: Option<ObjectId>,
    ) -> DaoResult<Vec<User>> {
        let mut filter = doc! { "email": email, "is_deleted": false, "is_active": true };
        if let Some(tenant_id) = tenant_id {
            filter.insert("tenant_id", tenant_id);
        }
        self.base.find_many(filter, Some(doc! { "created_at": 1 })).await
    }

    /// Direct lookup inside a scope. Soft-deleted users are still returned.
    pub async fn find_in_scope(&self, scope: &UserScope, id: ObjectId) -> DaoResult<User> {
        let mut filter = scope_filter(scope);
        if let UserScope::OnlySelf(self_id) = scope {
            if *self_id != id {
                return Err(DaoError::NotFound);
            }
        }
        filter.insert("_id", id);
        self.base.find_one(filter).await?.ok_or(DaoError::NotFound)
    }

    pub async fn list(
        &self,
        scope: &UserScope,
        user_filter: &UserFilter,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<User>> {
        let mut filter = doc! { "is_deleted": false };
        if let Some(role) = user_filter.role {
            filter.insert("role", bson::to_bson(&role)?);
        }
        if let Some(tenant_id) = user_filter.tenant_id {
            filter.insert("tenant_id", tenant_id);
        }
        if let Some(branch_id) = user_filter.branch_id {
            filter.insert("branch_id", branch_id);
        }
        filter.extend(scope_filter(scope));

        self.base
            .find_paginated(filter, Some(doc! { "created_at": 1 }), params)
            .await
    }

    pub async fn apply_patch(&self, id: ObjectId, patch: &UserPatch) -> DaoResult<User> {
        let set = patch.to_set()?;
        if !set.is_empty() {
            self.base.update_by_id(id, doc! { "$set": set }).await?;
        }
        self.base.find_by_id(id).await
    }

    /// Moves a user onto a tenant. Their branch belonged to the old tenant, so it is cleared.
    pub async fn bind_tenant(&self, id: ObjectId, tenant_id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_by_id(
                id,
                doc! { "$set": { "tenant_id": tenant_id, "branch_id": null } },
            )
            .await
    }

    pub async fn touch_login(&self, id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_by_id(id, doc! { "$set": { "last_login_at": DateTime::now() } })
            .await
    }

    pub async fn soft_delete(&self, id: ObjectId) -> DaoResult<bool> {
        self.base.soft_delete(id).await
    }
}
