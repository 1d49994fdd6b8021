//! User persistence

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, error};

use super::models::{User, UserUpsert};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

const USER_COLUMNS: &str =
    "id, firebase_uid, email, name, photo_url, provider, couple_id, created_at, updated_at";

/// Point lookups and upserts of users
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_firebase_uid(&self, firebase_uid: &str)
        -> Result<Option<User>, RepositoryError>;

    /// Creates the row for `user.firebase_uid` or overwrites its mutable fields,
    /// returning the stored row.
    async fn upsert(&self, user: &UserUpsert) -> Result<User, RepositoryError>;
}

pub struct SqliteUserRepository {
    db: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_by_firebase_uid(
        &self,
        firebase_uid: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE firebase_uid = ?",
            USER_COLUMNS
        ))
        .bind(firebase_uid)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, firebase_uid = %firebase_uid, "Database error looking up user");
            RepositoryError::DatabaseError(e)
        })?;

        debug!(
            firebase_uid = %firebase_uid,
            found = user.is_some(),
            "User lookup by firebase uid"
        );

        Ok(user)
    }

    async fn upsert(&self, user: &UserUpsert) -> Result<User, RepositoryError> {
        let saved = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (firebase_uid, email, name, photo_url, provider, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(firebase_uid) DO UPDATE SET
                email = excluded.email,
                name = excluded.name,
                photo_url = excluded.photo_url,
                provider = excluded.provider,
                updated_at = excluded.updated_at
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.firebase_uid)
        .bind(user.email.as_deref())
        .bind(user.name.as_deref())
        .bind(user.photo_url.as_deref())
        .bind(user.provider)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                firebase_uid = %user.firebase_uid,
                "Database error upserting user"
            );
            RepositoryError::DatabaseError(e)
        })?;

        Ok(saved)
    }
}
