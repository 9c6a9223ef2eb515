use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub token: String,
    pub tenant_id: ObjectId,
    pub role: Role,
    pub branch_id: Option<ObjectId>,
    pub invited_by: ObjectId,
    #[serde(default)]
    pub is_accepted: bool,
    pub accepted_at: Option<DateTime>,
    pub expires_at: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Lifecycle state. `Expired` is never stored; it is derived from `expires_at`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
}

impl Invitation {
    pub const COLLECTION: &'static str = "invitations";

    pub fn new_token() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn is_expired_at(&self, now: DateTime) -> bool {
        !self.is_accepted && now.timestamp_millis() > self.expires_at.timestamp_millis()
    }

    pub fn status_at(&self, now: DateTime) -> InvitationStatus {
        if self.is_accepted {
            InvitationStatus::Accepted
        } else if self.is_expired_at(now) {
            InvitationStatus::Expired
        } else {
            InvitationStatus::Pending
        }
    }

    pub fn status(&self) -> InvitationStatus {
        self.status_at(DateTime::now())
    }
}
