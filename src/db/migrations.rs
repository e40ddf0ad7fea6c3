//! Database initialization and schema migrations.

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// How long a writer waits on the SQLite write lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (creating if needed) the ladder database and bring its schema up to date.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).ok();
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    info!(path = %db_path, "ladder database ready");
    Ok(pool)
}

/// Apply `schema.sql`. Every statement is `IF NOT EXISTS`, so reruns are harmless.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut applied = 0usize;

    for statement in include_str!("schema.sql").split(';') {
        let trimmed = statement.trim();
        if trimmed.is_empty() {
            continue;
        }
        sqlx::query(trimmed).execute(&mut *tx).await?;
        applied += 1;
    }

    tx.commit().await?;
    info!(statements = applied, "schema migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn temp_pool() -> (SqlitePool, String, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("nested")
            .join("ladder.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (pool, db_path, temp_dir)
    }

    #[tokio::test]
    async fn test_init_db_creates_missing_directories() {
        let (pool, db_path, _temp) = temp_pool().await;
        assert!(Path::new(&db_path).exists());

        let (one,): (i64,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(one, 1);
    }

    #[tokio::test]
    async fn test_migrations_create_ladder_tables() {
        let (pool, _, _temp) = temp_pool().await;

        for table in [
            "players",
            "teams",
            "solo_matches",
            "team_matches",
            "rating_history",
        ] {
            let found: Option<(String,)> =
                sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                    .bind(table)
                    .fetch_optional(&pool)
                    .await
                    .unwrap();
            assert!(found.is_some(), "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_migrations_rerun_cleanly() {
        let (pool, _, _temp) = temp_pool().await;
        run_migrations(&pool).await.expect("second run failed");

        let (tables,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 5);
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let (pool, _, _temp) = temp_pool().await;

        let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);

        let orphan = sqlx::query(
            "INSERT INTO teams (player1_id, player2_id, created_at) VALUES (100, 200, 0)",
        )
        .execute(&pool)
        .await;
        assert!(orphan.is_err());
    }

    #[tokio::test]
    async fn test_schema_rejects_winner_outside_match() {
        let (pool, _, _temp) = temp_pool().await;

        for name in ["a", "b", "c"] {
            sqlx::query("INSERT INTO players (username, created_at) VALUES (?, 0)")
                .bind(name)
                .execute(&pool)
                .await
                .unwrap();
        }

        let result = sqlx::query(
            "INSERT INTO solo_matches (side1_id, side2_id, winner_id, created_at) VALUES (1, 2, 3, 0)",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }
}
