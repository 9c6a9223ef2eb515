use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use pos_db::models::{Tenant, TenantMailSettings};

use super::base::{BaseDao, DaoError, DaoResult, PaginatedResult, PaginationParams};
use crate::policy::TenantScope;

pub struct TenantDao {
    pub base: BaseDao<Tenant>,
}

impl TenantDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Tenant::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        name: String,
        domain: String,
        currency: String,
        mail: TenantMailSettings,
    ) -> DaoResult<Tenant> {
        let now = DateTime::now();
        let tenant = Tenant {
            id: None,
            name,
            domain,
            currency,
            is_active: true,
            mail,
            created_at: now,
            updated_at: now,
        };

        let tenant_id = self.base.insert_one(&tenant).await.map_err(|e| match e {
            DaoError::DuplicateKey(_) => {
                DaoError::DuplicateKey(format!("Domain '{}' is already taken", tenant.domain))
            }
            other => other,
        })?;

        self.base.find_by_id(tenant_id).await
    }

    pub async fn find_by_domain(&self, domain: &str) -> DaoResult<Tenant> {
        self.base
            .find_one(doc! { "domain": domain })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn domain_taken(&self, domain: &str) -> DaoResult<bool> {
        Ok(self.base.count(doc! { "domain": domain }).await? > 0)
    }

    pub async fn list(
        &self,
        scope: &TenantScope,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Tenant>> {
        let filter = match scope {
            TenantScope::All => doc! {},
            TenantScope::Only(tenant_id) => doc! { "_id": tenant_id },
            TenantScope::Nothing => return Ok(PaginatedResult::empty(params)),
        };
        self.base
            .find_paginated(filter, Some(doc! { "name": 1 }), params)
            .await
    }

    pub async fn find_in_scope(&self, scope: &TenantScope, id: ObjectId) -> DaoResult<Tenant> {
        match scope {
            TenantScope::All => self.base.find_by_id(id).await,
            TenantScope::Only(tenant_id) if *tenant_id == id => self.base.find_by_id(id).await,
            _ => Err(DaoError::NotFound),
        }
    }
}
