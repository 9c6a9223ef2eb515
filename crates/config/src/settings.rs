use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub mail: MailSettings,
    pub frontend: FrontendSettings,
    pub invitation: InvitationSettings,
    pub queue: QueueSettings,
    pub tenancy: TenancySettings,
    pub bootstrap: BootstrapSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub issuer: String,
}

/// Fallback SMTP relay, used when a tenant has no outbound mail host of its own.
#[derive(Debug, Deserialize, Clone)]
pub struct MailSettings {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub use_ssl: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FrontendSettings {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InvitationSettings {
    pub ttl_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueueSettings {
    pub capacity: usize,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TenancySettings {
    /// Lets an owner who already belongs to a tenant be moved onto a tenant they create.
    pub allow_rebind_on_create: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapSettings {
    pub superuser_email: Option<String>,
    pub superuser_password: Option<String>,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("POS"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 8000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "mongodb://localhost:27017/?replicaSet=rs0")?
            .set_default("database.name", "pos_accounts")?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 86400)?
            .set_default("jwt.refresh_token_ttl_secs", 604800)?
            .set_default("jwt.issuer", "pos-accounts")?
            .set_default("mail.host", "localhost")?
            .set_default("mail.port", 1025)?
            .set_default("mail.use_tls", false)?
            .set_default("mail.use_ssl", false)?
            .set_default("mail.username", None::<String>)?
            .set_default("mail.password", None::<String>)?
            .set_default("mail.from_address", "no-reply@localhost")?
            .set_default("mail.from_name", None::<String>)?
            .set_default("frontend.base_url", "http://localhost:3000")?
            .set_default("invitation.ttl_days", 7)?
            .set_default("queue.capacity", 1024)?
            .set_default("queue.max_attempts", 3)?
            .set_default("queue.retry_backoff_ms", 2000)?
            .set_default("tenancy.allow_rebind_on_create", false)?
            .set_default("bootstrap.superuser_email", None::<String>)?
            .set_default("bootstrap.superuser_password", None::<String>)?
            .build()?;

        config.try_deserialize()
    }
}
