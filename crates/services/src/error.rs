use thiserror::Error;

use crate::auth::AuthError;
use crate::background::DispatchError;
use crate::dao::base::DaoError;
use crate::policy::Denied;

/// Outcome of an account or invitation operation that did not go through.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Entity not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Validation: {0}")]
    Validation(String),
    #[error("You must be part of a tenant to do this")]
    NoTenant,
    #[error("This invitation has expired")]
    Expired,
    #[error("Dependency failure: {0}")]
    Dependency(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Storage(DaoError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<DaoError> for ServiceError {
    fn from(err: DaoError) -> Self {
        match err {
            DaoError::NotFound => ServiceError::NotFound,
            DaoError::DuplicateKey(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Storage(other),
        }
    }
}

impl From<Denied> for ServiceError {
    fn from(denied: Denied) -> Self {
        match denied {
            Denied::NoTenant => ServiceError::NoTenant,
            Denied::Forbidden(reason) => ServiceError::Forbidden(reason.to_string()),
        }
    }
}

impl From<DispatchError> for ServiceError {
    fn from(err: DispatchError) -> Self {
        ServiceError::Dependency(err.to_string())
    }
}
