//! # Vendex Server
//!
//! HTTP boundary for the Vendex platform: registration, login, email
//! confirmation, and bearer-token authentication over axum.
//!
//! The router is built by [`create_app`] from an [`AppState`] so the binary
//! and the integration tests assemble exactly the same application.

pub mod auth;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;

use axum::{
    Json, Router,
    http::{Method, header},
    routing::get,
};
use serde_json::{Value, json};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub fn create_app(state: AppState) -> Router {
    // Create versioned API routes
    let versioned_api = routes::create_api_router(state.clone());

    // Build CORS layer (permissive in dev, allow-list in prod)
    let cors_layer = if state.config.dev_mode {
        CorsLayer::permissive()
    } else {
        let origins: Vec<axum::http::HeaderValue> = state
            .config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| axum::http::HeaderValue::from_str(s).ok())
            .collect();
        let allow_origin = if origins.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(origins)
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
    };

    Router::new()
        .route("/health", get(health_handler))
        // Add versioned API routes
        .merge(versioned_api)
        // Add middleware layers in correct order (outer to inner):
        // 1. CORS (outermost)
        .layer(cors_layer)
        // 2. Tracing
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
