use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mongodb::{Client, Database, options::ClientOptions};
use pos_api::{build_router, state::AppState};
use pos_config::Settings;
use pos_db::indexes::ensure_indexes;
use pos_services::background::DispatchError;
use pos_services::mail::{MailJob, MemoryTransport, OutboundMessage};
use pos_services::MailDispatcher;
use tokio::net::TcpListener;

/// A running test application with its own MongoDB database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub db: Database,
    pub settings: Settings,
    pub client: reqwest::Client,
    /// Every email the app delivered, in order.
    pub mail: Arc<MemoryTransport>,
}

/// Refuses every job, as a full or stopped queue would.
pub struct RejectingDispatcher;

impl MailDispatcher for RejectingDispatcher {
    fn submit(&self, _job: MailJob) -> Result<(), DispatchError> {
        Err(DispatchError::QueueFull)
    }
}

impl TestApp {
    /// Spawn a new test server connected to the test MongoDB.
    ///
    /// Invitation redemption uses a transaction, so MongoDB must run as a
    /// replica set (a single node is enough). Set POS__DATABASE__URL to
    /// override the connection string. Each test gets a unique database.
    pub async fn spawn() -> Self {
        Self::launch(|_| {}, None).await
    }

    /// Spawn a test server with customized settings.
    pub async fn spawn_with_settings(mutator: impl FnOnce(&mut Settings)) -> Self {
        Self::launch(mutator, None).await
    }

    /// Spawn a test server whose mail queue refuses every submission.
    pub async fn spawn_with_rejecting_mail() -> Self {
        Self::launch(|_| {}, Some(Arc::new(RejectingDispatcher))).await
    }

    async fn launch(
        mutator: impl FnOnce(&mut Settings),
        dispatcher: Option<Arc<dyn MailDispatcher>>,
    ) -> Self {
        let db_name = format!("pos_test_{}", uuid::Uuid::new_v4().simple());

        let mut settings = Settings::load().unwrap_or_else(|_| test_settings());
        settings.database.name = db_name.clone();
        settings.queue.retry_backoff_ms = 10;
        mutator(&mut settings);

        let client_options = ClientOptions::parse(&settings.database.url)
            .await
            .expect("Failed to parse MongoDB URL");
        let mongo_client =
            Client::with_options(client_options).expect("Failed to create MongoDB client");
        let db = mongo_client.database(&db_name);

        ensure_indexes(&db).await.expect("Failed to create indexes");

        let mail = Arc::new(MemoryTransport::new());
        let app_state = match dispatcher {
            Some(dispatcher) => AppState::with_dispatcher(db.clone(), settings.clone(), dispatcher),
            None => AppState::with_transport(db.clone(), settings.clone(), mail.clone())
                .expect("Failed to create AppState"),
        };
        let app = build_router(app_state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}", addr);
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            base_url,
            db,
            settings,
            client,
            mail,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Waits for the mail worker to deliver `count` messages to `to`.
    pub async fn wait_for_mail(&self, to: &str, count: usize) -> Vec<OutboundMessage> {
        for _ in 0..200 {
            let sent = self.mail.sent_to(to);
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} email(s) to {to}, got {}", self.mail.sent_to(to).len());
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let db = self.db.clone();
        // Best effort cleanup: drop the test database
        tokio::spawn(async move {
            let _ = db.drop().await;
        });
    }
}

fn test_settings() -> Settings {
    Settings {
        app: pos_config::AppSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec![],
        },
        database: pos_config::DatabaseSettings {
            url: "mongodb://localhost:27017/?replicaSet=rs0".to_string(),
            name: "pos_test".to_string(),
            max_pool_size: Some(5),
            min_pool_size: Some(1),
        },
        jwt: pos_config::JwtSettings {
            secret: "test-secret-key-for-jwt-signing-minimum-32-chars".to_string(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 604800,
            issuer: "pos-accounts".to_string(),
        },
        mail: pos_config::MailSettings {
            host: "localhost".to_string(),
            port: 1025,
            use_tls: false,
            use_ssl: false,
            username: None,
            password: None,
            from_address: "no-reply@localhost".to_string(),
            from_name: None,
        },
        frontend: pos_config::FrontendSettings {
            base_url: "http://localhost:3000".to_string(),
        },
        invitation: pos_config::InvitationSettings { ttl_days: 7 },
        queue: pos_config::QueueSettings {
            capacity: 64,
            max_attempts: 3,
            retry_backoff_ms: 10,
        },
        tenancy: pos_config::TenancySettings {
            allow_rebind_on_create: false,
        },
        bootstrap: pos_config::BootstrapSettings {
            superuser_email: None,
            superuser_password: None,
        },
    }
}
