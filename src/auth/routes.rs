//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /auth/firebase` - Firebase ID token sign-in
/// - `GET /health` - Liveness probe
pub fn auth_routes() -> Router {
    Router::new()
        .route("/auth/firebase", post(handlers::firebase_auth))
        .route("/health", get(handlers::health_handler))
}
