use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use pos_db::models::Branch;

use super::base::{BaseDao, DaoResult};
use crate::policy::TenantScope;

pub struct BranchDao {
    pub base: BaseDao<Branch>,
}

impl BranchDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Branch::COLLECTION),
        }
    }

    pub async fn create(&self, tenant_id: ObjectId, name: String) -> DaoResult<Branch> {
        let now = DateTime::now();
        let branch = Branch {
            id: None,
            tenant_id,
            name,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let id = self.base.insert_one(&branch).await?;
        self.base.find_by_id(id).await
    }

    pub async fn list(&self, scope: &TenantScope) -> DaoResult<Vec<Branch>> {
        let filter = match scope {
            TenantScope::All => doc! {},
            TenantScope::Only(tenant_id) => doc! { "tenant_id": tenant_id },
            TenantScope::Nothing => return Ok(Vec::new()),
        };
        self.base.find_many(filter, Some(doc! { "name": 1 })).await
    }

    pub async fn find_in_tenant(&self, tenant_id: ObjectId, id: ObjectId) -> DaoResult<Branch> {
        self.base.find_by_id_in_tenant(tenant_id, id).await
    }
}
