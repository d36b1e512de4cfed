use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{auth, infra::app_state::AppState};

/// Create all v1 API routes
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        // Public authentication endpoints
        .route("/auth/register", post(auth::handlers::register))
        .route("/auth/login", post(auth::handlers::login))
        .route("/auth/confirm", get(auth::handlers::confirm))
        // Merge protected routes
        .merge(create_protected_routes(state))
}

/// Create protected routes that require authentication
fn create_protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(auth::handlers::me))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::middleware::auth_middleware,
        ))
}
