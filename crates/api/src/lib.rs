pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.app.cors_origins);

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/token/refresh", post(routes::auth::refresh))
        .route("/profile", get(routes::auth::profile));

    let tenant_routes = Router::new()
        .route("/", get(routes::tenant::list).post(routes::tenant::create));

    let user_routes = Router::new()
        .route("/", get(routes::user::list))
        .route(
            "/{user_id}",
            get(routes::user::get)
                .patch(routes::user::update)
                .delete(routes::user::delete),
        );

    let invitation_routes = Router::new()
        .route("/", get(routes::invitation::list).post(routes::invitation::create))
        .route("/accept", post(routes::invitation::accept))
        .route("/{invitation_id}/resend", post(routes::invitation::resend));

    let branch_routes = Router::new()
        .route("/", get(routes::branch::list).post(routes::branch::create));

    let api = Router::new()
        .merge(auth_routes)
        .nest("/tenants", tenant_routes)
        .nest("/users", user_routes)
        .nest("/invitations", invitation_routes)
        .nest("/branches", branch_routes)
        .route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(allowed)
    }
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
