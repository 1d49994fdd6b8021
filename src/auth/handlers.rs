//! Authentication handlers

use axum::extract::{rejection::JsonRejection, Extension, Json};
use std::sync::Arc;
use tracing::{error, info};

use super::models::{AuthResponse, FirebaseAuthRequest};
use crate::common::{ApiError, AppState};

/// POST /auth/firebase
/// Exchanges a Firebase ID token for the user's profile and couple state
///
/// # Request Body
/// ```json
/// {
///   "idToken": "<firebase id token>"
/// }
/// ```
///
/// # Response
/// ```json
/// {
///   "user": { "id": 1, "firebaseUid": "...", "provider": "GOOGLE", ... },
///   "coupleState": { "hasPartner": false }
/// }
/// ```
pub async fn firebase_auth(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<FirebaseAuthRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    info!("🔐 Received Firebase authentication request");

    let Json(request) = payload.map_err(|rejection| {
        error!(error = %rejection.body_text(), "Unreadable Firebase authentication request");
        ApiError::InternalServer(rejection.body_text())
    })?;

    let response = state.auth_service.authenticate(&request.id_token).await?;

    info!(
        user_id = response.user.id,
        provider = %response.user.provider,
        has_partner = response.couple_state.has_partner,
        "User authentication successful via Firebase"
    );

    Ok(Json(response))
}

/// GET /health
/// Liveness probe that also checks the database connection
pub async fn health_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::InternalServer(format!("database unavailable: {}", e)))?;

    Ok(Json(serde_json::json!({ "status": "ok" })))
}
