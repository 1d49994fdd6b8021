//! Couple lookups

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, error};

use super::models::Couple;
use crate::users::{RepositoryError, User};

#[async_trait]
pub trait CoupleRepository: Send + Sync {
    /// The couple `user` belongs to, if any
    async fn find_by_user(&self, user: &User) -> Result<Option<Couple>, RepositoryError>;
}

pub struct SqliteCoupleRepository {
    db: SqlitePool,
}

impl SqliteCoupleRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CoupleRepository for SqliteCoupleRepository {
    async fn find_by_user(&self, user: &User) -> Result<Option<Couple>, RepositoryError> {
        let Some(couple_id) = user.couple_id else {
            return Ok(None);
        };

        let couple = sqlx::query_as::<_, Couple>(
            "SELECT id, couple_name, created_at, updated_at FROM couples WHERE id = ?",
        )
        .bind(couple_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = user.id, couple_id, "Database error loading couple");
            RepositoryError::DatabaseError(e)
        })?;

        if couple.is_none() {
            debug!(user_id = user.id, couple_id, "User references a missing couple");
        }

        Ok(couple)
    }
}
