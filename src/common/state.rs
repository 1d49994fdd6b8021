// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::auth::AuthService;

/// Application state containing the database pool and the auth service
///
/// Nothing in here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub auth_service: Arc<AuthService>,
}
