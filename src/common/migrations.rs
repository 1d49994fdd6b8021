// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use tracing::{info, warn};

/// Run all database migrations
///
/// Tables are only dropped when `reset` is set (RESET_DB=true), so restarts
/// keep existing data.
pub async fn run_migrations(pool: &SqlitePool, reset: bool) -> Result<(), sqlx::Error> {
    if reset {
        warn!("⚠️  RESET_DB=true - Dropping all tables and recreating schema...");
        drop_all_tables(pool).await?;
        info!("✅ Dropped old tables");
    } else {
        info!("ℹ️  Skipping table drop (RESET_DB not set). Tables will be created if they don't exist.");
    }

    create_couple_tables(pool).await?;
    create_user_tables(pool).await?;
    create_indexes(pool).await?;

    info!("✅ Database migration completed successfully!");

    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Reverse dependency order
    for table in ["users", "couples"] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }

    Ok(())
}

async fn create_couple_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS couples (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            couple_name TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_user_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            firebase_uid TEXT UNIQUE NOT NULL,
            email TEXT,
            name TEXT,
            photo_url TEXT,
            provider TEXT NOT NULL CHECK (provider IN ('GOOGLE', 'EMAIL')),
            couple_id INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(couple_id) REFERENCES couples(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_users_couple_id ON users(couple_id)",
    ];

    for index in indexes {
        sqlx::query(index).execute(pool).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database")
    }

    async fn table_names(pool: &SqlitePool) -> Vec<String> {
        sqlx::query_as::<_, (String,)>(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(pool)
        .await
        .expect("Failed to list tables")
        .into_iter()
        .map(|(name,)| name)
        .collect()
    }

    #[tokio::test]
    async fn test_migrations_create_tables() {
        let pool = memory_pool().await;
        run_migrations(&pool, false).await.expect("migrations failed");

        assert_eq!(table_names(&pool).await, vec!["couples", "users"]);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = memory_pool().await;
        run_migrations(&pool, false).await.expect("first run failed");
        run_migrations(&pool, false).await.expect("second run failed");
    }

    #[tokio::test]
    async fn test_reset_drops_existing_rows() {
        let pool = memory_pool().await;
        run_migrations(&pool, false).await.unwrap();

        sqlx::query(
            "INSERT INTO couples (couple_name, created_at, updated_at) VALUES ('x', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        run_migrations(&pool, true).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM couples")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_provider_check_constraint() {
        let pool = memory_pool().await;
        run_migrations(&pool, false).await.unwrap();

        let result = sqlx::query(
            "INSERT INTO users (firebase_uid, provider, created_at, updated_at) VALUES ('uid', 'GITHUB', 'now', 'now')",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err(), "unknown provider should be rejected");
    }
}
