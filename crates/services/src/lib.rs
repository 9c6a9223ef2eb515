pub mod accounts;
pub mod auth;
pub mod background;
pub mod dao;
pub mod error;
pub mod invitation;
pub mod mail;
pub mod policy;

pub use accounts::AccountService;
pub use auth::AuthService;
pub use background::{MailDispatcher, MailQueue};
pub use dao::base::{DaoError, DaoResult, PaginatedResult, PaginationParams};
pub use error::{ServiceError, ServiceResult};
pub use invitation::InvitationService;
