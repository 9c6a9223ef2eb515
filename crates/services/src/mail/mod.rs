pub mod memory;
pub mod smtp;
pub mod templates;

use std::fmt;

use async_trait::async_trait;
use pos_config::MailSettings;
use pos_db::models::Tenant;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryTransport;
pub use smtp::SmtpMailer;
pub use templates::MailTemplates;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Template error: {0}")]
    Template(String),
    #[error("Invalid address: {0}")]
    Address(String),
    #[error("Message build error: {0}")]
    Build(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Security {
    None,
    StartTls,
    /// Implicit TLS from the first byte (SMTPS).
    Tls,
}

/// Connection and sender identity for one outbound message.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    pub security: Security,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: Option<String>,
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .finish()
    }
}

impl TransportConfig {
    /// Uses the tenant's own SMTP account when it has one, the global relay otherwise.
    /// Either way the sender is named after the tenant unless it set a name itself.
    pub fn for_tenant(tenant: &Tenant, fallback: &MailSettings) -> Self {
        let mail = &tenant.mail;
        let from_name = mail
            .from_name
            .clone()
            .or_else(|| Some(tenant.name.clone()));

        if mail.is_configured() {
            let security = if mail.use_ssl {
                Security::Tls
            } else if mail.use_tls {
                Security::StartTls
            } else {
                Security::None
            };
            let port = mail.port.unwrap_or(match security {
                Security::Tls => 465,
                Security::StartTls => 587,
                Security::None => 25,
            });
            Self {
                host: mail.host.clone().unwrap_or_default(),
                port,
                security,
                username: mail.username.clone(),
                password: mail.password.clone(),
                from_address: mail
                    .from_address
                    .clone()
                    .or_else(|| mail.username.clone())
                    .unwrap_or_else(|| fallback.from_address.clone()),
                from_name,
            }
        } else {
            Self::from_settings(fallback, from_name)
        }
    }

    pub fn from_settings(settings: &MailSettings, from_name: Option<String>) -> Self {
        let security = if settings.use_ssl {
            Security::Tls
        } else if settings.use_tls {
            Security::StartTls
        } else {
            Security::None
        };
        Self {
            host: settings.host.clone(),
            port: settings.port,
            security,
            username: settings.username.clone(),
            password: settings.password.clone(),
            from_address: settings.from_address.clone(),
            from_name: from_name.or_else(|| settings.from_name.clone()),
        }
    }
}

/// A unit of mail work: everything needed to render and deliver one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailJob {
    pub transport: TransportConfig,
    pub subject: String,
    pub to: String,
    pub template: String,
    pub context: serde_json::Value,
}

/// A rendered message ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync + 'static {
    async fn send(
        &self,
        config: &TransportConfig,
        message: &OutboundMessage,
    ) -> Result<(), MailError>;

    fn name(&self) -> &str;
}
