use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{handlers, titles};
use crate::metrics::metrics_middleware;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.config().server.cors_origins);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Downloads
        .route(
            "/v1/titles/{tid}/versions/{ver}/download/wad",
            get(titles::download_wad),
        )
        .route(
            "/v1/titles/{tid}/versions/{ver}/download/enc",
            get(titles::download_enc),
        )
        .route(
            "/v1/titles/{tid}/versions/{ver}/download/dec",
            get(titles::download_dec),
        )
        .route(
            "/v1/titles/{tid}/versions/{ver}/download/tad",
            get(titles::download_tad),
        )
        .layer(middleware::from_fn(metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the CORS layer from the configured origin allow-list.
///
/// An empty list opens the service to any origin (credentials off, which
/// the wildcard requires); configured origins additionally allow
/// credentialed requests. Either way the metadata header stays readable
/// cross-origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let expose = [axum::http::HeaderName::from_static("x-metadata")];

    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(expose);
    }

    let list: Vec<axum::http::HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(list)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .expose_headers(expose)
}
