//! Tests for users module
//!
//! These tests run the SQLite repository against an in-memory database:
//! - Insert on first upsert
//! - Overwrite on conflict, keeping id and created_at
//! - Lookups by firebase uid and email

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::migrations::run_migrations;
    use crate::test_support::fixed_time;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    async fn repository() -> (SqliteUserRepository, SqlitePool) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");
        run_migrations(&pool, false).await.expect("migrations failed");
        (SqliteUserRepository::new(pool.clone()), pool)
    }

    fn upsert(uid: &str, email: &str, provider: Provider, hour: u32) -> UserUpsert {
        UserUpsert {
            firebase_uid: uid.to_string(),
            email: Some(email.to_string()),
            name: Some("Test User".to_string()),
            photo_url: Some("https://example.com/photo.jpg".to_string()),
            provider,
            created_at: fixed_time(hour),
            updated_at: fixed_time(hour),
        }
    }

    #[test]
    fn test_provider_display() {
        assert_eq!(Provider::Google.to_string(), "GOOGLE");
        assert_eq!(Provider::Email.as_str(), "EMAIL");
        assert_eq!(serde_json::to_string(&Provider::Google).unwrap(), "\"GOOGLE\"");
        assert_eq!(
            serde_json::from_str::<Provider>("\"EMAIL\"").unwrap(),
            Provider::Email
        );
    }

    #[tokio::test]
    async fn test_upsert_inserts_new_user() {
        let (repo, _pool) = repository().await;

        let user = repo
            .upsert(&upsert("uid-1", "a@x.com", Provider::Google, 1))
            .await
            .unwrap();

        assert!(user.id > 0);
        assert_eq!(user.firebase_uid, "uid-1");
        assert_eq!(user.email.as_deref(), Some("a@x.com"));
        assert_eq!(user.provider, Provider::Google);
        assert_eq!(user.couple_id, None);
        assert_eq!(user.created_at, fixed_time(1));
        assert_eq!(user.updated_at, fixed_time(1));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_user() {
        let (repo, pool) = repository().await;
        let first = repo
            .upsert(&upsert("uid-1", "a@x.com", Provider::Google, 1))
            .await
            .unwrap();

        let mut change = upsert("uid-1", "b@x.com", Provider::Email, 5);
        change.photo_url = None;
        let second = repo.upsert(&change).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.email.as_deref(), Some("b@x.com"));
        assert_eq!(second.provider, Provider::Email);
        assert_eq!(second.photo_url, None);
        assert_eq!(second.created_at, fixed_time(1));
        assert_eq!(second.updated_at, fixed_time(5));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_find_by_firebase_uid() {
        let (repo, _pool) = repository().await;
        assert_eq!(repo.find_by_firebase_uid("uid-1").await.unwrap(), None);

        let saved = repo
            .upsert(&upsert("uid-1", "a@x.com", Provider::Google, 1))
            .await
            .unwrap();

        let found = repo.find_by_firebase_uid("uid-1").await.unwrap();
        assert_eq!(found, Some(saved));
    }

    #[tokio::test]
    async fn test_closed_pool_surfaces_database_error() {
        let (repo, pool) = repository().await;
        pool.close().await;

        let result = repo.find_by_firebase_uid("uid-1").await;
        assert!(matches!(result, Err(RepositoryError::DatabaseError(_))));
    }
}
