use pos_api::{build_router, state::AppState};
use pos_config::Settings;
use pos_db::{connect, indexes::ensure_indexes};
use pos_services::accounts::SuperuserBootstrap;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "pos_api=debug,pos_services=debug,pos_db=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    info!("Starting POS accounts API on {}:{}", settings.app.host, settings.app.port);
    info!(
        mail_host = %settings.mail.host,
        mail_port = settings.mail.port,
        queue_capacity = settings.queue.capacity,
        invitation_ttl_days = settings.invitation.ttl_days,
        "Mail/invitation config"
    );

    let db = connect(&settings).await?;
    ensure_indexes(&db).await?;

    let app_state = AppState::new(db, settings.clone())?;

    match (
        settings.bootstrap.superuser_email.as_deref(),
        settings.bootstrap.superuser_password.as_deref(),
    ) {
        (Some(email), Some(password)) => {
            match app_state.accounts.ensure_superuser(email, password).await? {
                SuperuserBootstrap::Created(_) => {}
                SuperuserBootstrap::AlreadyPresent => info!(%email, "Superuser already present"),
                SuperuserBootstrap::EmailHeldByRegularUser => warn!(
                    %email,
                    "A regular tenant-less account already uses the bootstrap email; no superuser was created"
                ),
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            warn!("Both bootstrap.superuser_email and bootstrap.superuser_password are needed; skipping superuser bootstrap");
        }
        (None, None) => {}
    }

    let app = build_router(app_state);

    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
