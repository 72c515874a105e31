use std::sync::Arc;

use axum::http::{header, HeaderValue, Method, Uri};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::config::defaults;
use crate::core::errors::ApiError;
use crate::server::handlers::{config, health, retrieval, strategy};
use crate::state::AppState;

/// Creates the application router.
///
/// - `GET /health`
/// - `POST /api/retrieve`, `POST /api/context`
/// - `POST /api/generate_strategy`, `POST /api/regenerate`
/// - `GET /api/config`
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state);
    Router::new()
        .route("/health", get(health::health))
        .route("/api/retrieve", post(retrieval::retrieve))
        .route("/api/context", post(retrieval::context))
        .route("/api/generate_strategy", post(strategy::generate_strategy))
        .route("/api/regenerate", post(strategy::regenerate))
        .route("/api/config", get(config::get_config))
        .fallback(not_found)
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}

fn build_cors_layer(state: &Arc<AppState>) -> CorsLayer {
    let allowed_origins = resolve_allowed_origins(&state.settings.server.cors_allowed_origins)
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(&origin).ok())
        .collect::<Vec<_>>();
    let allow_origin = AllowOrigin::list(allowed_origins);

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
}

fn resolve_allowed_origins(configured: &[String]) -> Vec<String> {
    let origins = configured
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return defaults::local_origins();
    }

    origins
}
