pub mod auth;
pub mod branch;
pub mod invitation;
pub mod tenant;
pub mod user;

use bson::{oid::ObjectId, DateTime};

use crate::error::ApiError;

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::Validation(format!("Invalid {what}")))
}

pub(crate) fn parse_optional_id(raw: Option<&str>, what: &str) -> Result<Option<ObjectId>, ApiError> {
    raw.map(|id| parse_id(id, what)).transpose()
}

pub(crate) fn hex(id: Option<ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}

pub(crate) fn timestamp(at: DateTime) -> String {
    at.try_to_rfc3339_string().unwrap_or_default()
}
