use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// アップロード上限（20 MiB）
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// APIルーターを構築
///
/// NOTE: パスパラメータは `:param` 記法（axum 0.7）
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/history", get(handlers::history))
        .route("/api/analysis/:id", get(handlers::analysis))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
