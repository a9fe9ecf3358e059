//! Router configuration for Web API.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::handlers::{
    backup_files, create_backup, delete_file, download_file, list_backups, list_files, login,
    preview_file, rename_file, restore_backup, signup, update_account, upload_file, AppState,
};
use super::middleware::create_cors_layer;
use crate::config::WebConfig;

/// Create the main router.
///
/// `max_upload_bytes` caps request bodies, which bounds uploads.
pub fn create_router(app_state: Arc<AppState>, web: &WebConfig, max_upload_bytes: usize) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login));

    let file_routes = Router::new()
        .route("/", get(list_files).post(upload_file))
        .route("/rename", post(rename_file))
        .route("/:name", get(preview_file).delete(delete_file))
        .route("/:name/download", get(download_file));

    let backup_routes = Router::new()
        .route("/", get(list_backups).post(create_backup))
        .route("/:date", get(backup_files))
        .route("/:date/restore", post(restore_backup));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .route("/account", put(update_account))
        .nest("/files", file_routes)
        .nest("/backups", backup_routes);

    let mut router = Router::new()
        .nest("/api", api_routes)
        .with_state(app_state)
        .merge(create_health_router());

    if web.serve_static {
        router = router.fallback_service(ServeDir::new(&web.static_path));
    }

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer(&web.cors_origins))
            .layer(DefaultBodyLimit::max(max_upload_bytes)),
    )
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}
