use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// A physical location of a tenant. Removed together with its tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub tenant_id: ObjectId,
    pub name: String,
    #[serde(default = "bool_true")]
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

fn bool_true() -> bool {
    true
}

impl Branch {
    pub const COLLECTION: &'static str = "branches";
}
