pub mod branch;
pub mod invitation;
pub mod role;
pub mod tenant;
pub mod user;

pub use branch::Branch;
pub use invitation::{Invitation, InvitationStatus};
pub use role::Role;
pub use tenant::{Tenant, TenantMailSettings};
pub use user::{User, normalize_email};
