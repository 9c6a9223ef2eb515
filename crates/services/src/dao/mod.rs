pub mod base;
pub mod branch;
pub mod invitation;
pub mod tenant;
pub mod user;

pub use base::BaseDao;
