pub mod mail_queue;

pub use mail_queue::{DispatchError, MailDispatcher, MailQueue};
