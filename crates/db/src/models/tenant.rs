use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub domain: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "bool_true")]
    pub is_active: bool,
    #[serde(default)]
    pub mail: TenantMailSettings,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Outbound SMTP credentials owned by a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantMailSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    #[serde(default = "bool_true")]
    pub use_tls: bool,
    #[serde(default)]
    pub use_ssl: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
}

impl Default for TenantMailSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            use_tls: true,
            use_ssl: false,
            username: None,
            password: None,
            from_address: None,
            from_name: None,
        }
    }
}

impl TenantMailSettings {
    pub fn is_configured(&self) -> bool {
        self.host.as_deref().is_some_and(|h| !h.trim().is_empty())
    }
}

fn bool_true() -> bool {
    true
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Tenant {
    pub const COLLECTION: &'static str = "tenants";
}
