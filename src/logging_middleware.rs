// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode

use axum::body::{to_bytes, Bytes};
use axum::{body::Body, extract::Request, middleware::Next, response::Response};
use serde_json::Value;
use tracing::{debug, enabled, Level};

use crate::common::{safe_token_log, ApiError};

/// Request body fields that must never reach the logs verbatim
const SECRET_FIELDS: &[&str] = &["idToken"];

/// Largest body the middleware will buffer for logging
const MAX_LOGGED_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, ApiError> {
    if !enabled!(Level::DEBUG) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let bytes = buffer_body(body).await?;

    if !bytes.is_empty() {
        debug!(
            method = %parts.method,
            uri = %parts.uri,
            request_body = %render_body(&bytes),
            "📥 Request"
        );
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let bytes = buffer_body(body).await?;

    if !bytes.is_empty() {
        debug!(
            status = %parts.status,
            response_body = %render_body(&bytes),
            "📤 Response"
        );
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}

async fn buffer_body(body: Body) -> Result<Bytes, ApiError> {
    to_bytes(body, MAX_LOGGED_BODY_BYTES)
        .await
        .map_err(|e| ApiError::InternalServer(format!("Failed to read body: {}", e)))
}

/// Pretty-prints JSON bodies with secrets masked; other text passes through
fn render_body(bytes: &[u8]) -> String {
    let Ok(body_str) = std::str::from_utf8(bytes) else {
        return format!("<{} bytes of binary data>", bytes.len());
    };

    match serde_json::from_str::<Value>(body_str) {
        Ok(mut json) => {
            mask_secrets(&mut json);
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| body_str.to_string())
        }
        Err(_) => body_str.to_string(),
    }
}

fn mask_secrets(json: &mut Value) {
    if let Value::Object(map) = json {
        for field in SECRET_FIELDS {
            if let Some(Value::String(secret)) = map.get_mut(*field) {
                *secret = safe_token_log(secret);
            }
        }
    }
}
