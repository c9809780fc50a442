pub mod auth;
pub mod error;
pub mod extract;
pub mod listings;
pub mod mailer;
pub mod messages;
pub mod middleware;
pub mod reports;
pub mod uploads;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post},
};
use serde_json::{Value, json};
use tracing::error;

use campus_db::Database;

pub use auth::{AppState, AppStateInner};
pub use error::{ApiError, ApiResult};
pub use extract::JsonBody;

/// Base64 inflates an 8 MB image to roughly 11 MB, so JSON bodies get headroom.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// All REST routes, nested under `/api`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/auth/login", post(auth::login))
        .route("/listings", get(listings::list_listings))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/upload", post(uploads::upload_image))
        .route("/listings", post(listings::create_listing))
        .route(
            "/listings/{id}",
            patch(listings::update_listing).delete(listings::delete_listing),
        )
        .route("/messages", get(messages::list_messages).post(messages::send_message))
        .route("/reports", post(reports::create_report))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Run a blocking DB call off the async runtime.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Unexpected(e.into())
        })?
        .map_err(ApiError::from)
}

/// A request field that is present and not blank.
pub(crate) fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}
